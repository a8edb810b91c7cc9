/* crates/strata-core/src/resolve.rs */

use std::collections::HashSet;

use crate::context::DeviceKind;

/// Raw request signals an adapter extracts for locale resolution. The engine
/// core stays HTTP-framework agnostic; adapters hand in plain header strings.
pub struct ResolveContext<'a> {
  pub query_locale: Option<&'a str>,
  pub cookie_header: Option<&'a str>,
  pub accept_language: Option<&'a str>,
  pub locales: &'a [String],
  pub default_locale: &'a str,
}

/// Resolve chain: explicit query locale -> cookie("strata-locale") ->
/// Accept-Language -> default locale. Unknown locales fall through.
pub fn resolve_locale(ctx: &ResolveContext<'_>) -> String {
  let locale_set: HashSet<&str> = ctx.locales.iter().map(|s| s.as_str()).collect();

  if let Some(loc) = ctx.query_locale {
    if locale_set.contains(loc) {
      return loc.to_string();
    }
  }

  if let Some(header) = ctx.cookie_header {
    if let Some(loc) = parse_cookie_value(header, "strata-locale") {
      if locale_set.contains(loc) {
        return loc.to_string();
      }
    }
  }

  if let Some(header) = ctx.accept_language {
    if let Some(loc) = parse_accept_language(header, &locale_set) {
      return loc;
    }
  }

  ctx.default_locale.to_string()
}

pub fn parse_cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
  for pair in header.split(';') {
    let pair = pair.trim();
    if let Some((k, v)) = pair.split_once('=') {
      if k.trim() == name {
        return Some(v.trim());
      }
    }
  }
  None
}

fn parse_accept_language(header: &str, locale_set: &HashSet<&str>) -> Option<String> {
  if header.is_empty() {
    return None;
  }

  let mut entries: Vec<(&str, f64)> = Vec::new();
  for part in header.split(',') {
    let part = part.trim();
    if part.is_empty() {
      continue;
    }
    let mut segments = part.split(';');
    let lang = segments.next().unwrap_or("").trim();
    let mut q = 1.0_f64;
    for s in segments {
      if let Some(val) = s.trim().strip_prefix("q=") {
        if let Ok(v) = val.parse::<f64>() {
          q = v;
        }
      }
    }
    entries.push((lang, q));
  }

  entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

  for (lang, _) in &entries {
    if locale_set.contains(lang) {
      return Some((*lang).to_string());
    }
    // Prefix match: fr-CA -> fr
    if let Some(idx) = lang.find('-') {
      let prefix = &lang[..idx];
      if locale_set.contains(prefix) {
        return Some(prefix.to_string());
      }
    }
  }

  None
}

/// Coarse device classification from the User-Agent string. Anything
/// unrecognized is treated as desktop.
pub fn sniff_device(user_agent: Option<&str>) -> DeviceKind {
  let Some(ua) = user_agent else {
    return DeviceKind::Desktop;
  };
  let lower = ua.to_ascii_lowercase();
  if lower.contains("ipad") || lower.contains("tablet") {
    DeviceKind::Tablet
  } else if lower.contains("mobi") || lower.contains("iphone") || lower.contains("android") {
    DeviceKind::Mobile
  } else {
    DeviceKind::Desktop
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ctx<'a>(
    query: Option<&'a str>,
    cookie: Option<&'a str>,
    accept: Option<&'a str>,
    locales: &'a [String],
  ) -> ResolveContext<'a> {
    ResolveContext {
      query_locale: query,
      cookie_header: cookie,
      accept_language: accept,
      locales,
      default_locale: "en",
    }
  }

  fn locales() -> Vec<String> {
    vec!["en".into(), "fr".into(), "es".into()]
  }

  #[test]
  fn query_locale_wins() {
    let l = locales();
    assert_eq!(resolve_locale(&ctx(Some("fr"), Some("strata-locale=es"), None, &l)), "fr");
  }

  #[test]
  fn unknown_query_locale_falls_through() {
    let l = locales();
    assert_eq!(resolve_locale(&ctx(Some("de"), Some("strata-locale=es"), None, &l)), "es");
  }

  #[test]
  fn cookie_beats_accept_language() {
    let l = locales();
    assert_eq!(resolve_locale(&ctx(None, Some("strata-locale=es"), Some("fr"), &l)), "es");
  }

  #[test]
  fn accept_language_q_priority() {
    let l = locales();
    assert_eq!(resolve_locale(&ctx(None, None, Some("en;q=0.4,fr;q=0.9"), &l)), "fr");
  }

  #[test]
  fn accept_language_prefix_match() {
    let l = locales();
    assert_eq!(resolve_locale(&ctx(None, None, Some("fr-CA,de;q=0.5"), &l)), "fr");
  }

  #[test]
  fn falls_back_to_default() {
    let l = locales();
    assert_eq!(resolve_locale(&ctx(None, None, None, &l)), "en");
  }

  #[test]
  fn cookie_with_multiple_pairs() {
    let l = locales();
    let cookie = Some("session=abc; strata-locale=fr; theme=dark");
    assert_eq!(resolve_locale(&ctx(None, cookie, None, &l)), "fr");
  }

  #[test]
  fn sniffs_device_kinds() {
    assert_eq!(sniff_device(Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)")), DeviceKind::Mobile);
    assert_eq!(sniff_device(Some("Mozilla/5.0 (iPad; CPU OS 17_0)")), DeviceKind::Tablet);
    assert_eq!(sniff_device(Some("Mozilla/5.0 (Macintosh; Intel Mac OS X)")), DeviceKind::Desktop);
    assert_eq!(sniff_device(None), DeviceKind::Desktop);
  }
}
