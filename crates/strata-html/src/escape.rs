/* crates/strata-html/src/escape.rs */

/// Escape text for safe interpolation into HTML element content or
/// double-quoted attribute values.
pub fn escape_html(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for ch in input.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn escapes_markup_characters() {
    assert_eq!(escape_html("<b>\"a\" & 'b'</b>"), "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;");
  }

  #[test]
  fn passes_plain_text_through() {
    assert_eq!(escape_html("Mac repair from $79"), "Mac repair from $79");
  }
}
