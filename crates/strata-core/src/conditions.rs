/* crates/strata-core/src/conditions.rs */

use chrono::{DateTime, Utc};

use crate::context::RenderContext;

/// Visibility conditions are a small closed operator set, not an expression
/// language:
///
///   feature:<name>   context feature set contains <name>
///   !feature:<name>  context feature set lacks <name>
///   feature~<sub>    any context feature contains <sub>
///   role:<role>      authenticated user role equals <role>
///   !role:<role>     no user, or user role differs from <role>
///   after:<rfc3339>  now is at or past the threshold
///   before:<rfc3339> now is before the threshold
///
/// Malformed or unrecognized conditions evaluate to false so a typo hides a
/// section instead of exposing it.
pub fn evaluate_condition(condition: &str, ctx: &RenderContext) -> bool {
  if let Some(name) = condition.strip_prefix("!feature:") {
    return !ctx.has_feature(name);
  }
  if let Some(name) = condition.strip_prefix("feature:") {
    return ctx.has_feature(name);
  }
  if let Some(sub) = condition.strip_prefix("feature~") {
    return ctx.features.iter().any(|f| f.contains(sub));
  }
  if let Some(role) = condition.strip_prefix("!role:") {
    return ctx.user.as_ref().is_none_or(|u| u.role != role);
  }
  if let Some(role) = condition.strip_prefix("role:") {
    return ctx.user.as_ref().is_some_and(|u| u.role == role);
  }
  if let Some(ts) = condition.strip_prefix("after:") {
    return parse_threshold(ts).is_some_and(|t| Utc::now() >= t);
  }
  if let Some(ts) = condition.strip_prefix("before:") {
    return parse_threshold(ts).is_some_and(|t| Utc::now() < t);
  }
  log::warn!("unrecognized visibility condition {condition:?}");
  false
}

/// All conditions must pass (logical AND). An empty list passes.
pub fn evaluate_all(conditions: &[String], ctx: &RenderContext) -> bool {
  conditions.iter().all(|c| evaluate_condition(c, ctx))
}

/// Conditions usable in `if:`-prefixed prop keys: `authenticated`, `preview`,
/// or a bare feature-flag name.
pub fn evaluate_prop_condition(condition: &str, ctx: &RenderContext) -> bool {
  match condition {
    "authenticated" => ctx.user.is_some(),
    "preview" => ctx.preview,
    name => ctx.has_feature(name),
  }
}

fn parse_threshold(value: &str) -> Option<DateTime<Utc>> {
  match DateTime::parse_from_rfc3339(value) {
    Ok(t) => Some(t.with_timezone(&Utc)),
    Err(err) => {
      log::warn!("invalid time threshold {value:?}: {err}");
      None
    }
  }
}
