/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes `text` and turns each line break (`\n` or `\r\n`) into `<br/>`.
pub fn to_display_markup(text: &str) -> String {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br/>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn line_breaks_become_br() {
        assert_eq!(to_display_markup("one\ntwo\r\nthree"), "one<br/>two<br/>three");
        assert_eq!(to_display_markup("trailing\n"), "trailing<br/>");
        assert_eq!(to_display_markup(""), "");
    }
}
