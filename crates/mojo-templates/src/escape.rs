//! HTML entity escaping for `{{name}}` output.

const ENTITIES: [(char, &str); 8] = [
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    ('"', "&quot;"),
    ('\'', "&#39;"),
    ('/', "&#x2F;"),
    ('`', "&#x60;"),
    ('=', "&#x3D;"),
];

fn entity_for(ch: char) -> Option<&'static str> {
    ENTITIES
        .iter()
        .find_map(|(raw, entity)| (*raw == ch).then_some(*entity))
}

/// Replace every character of the escape table with its entity.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match entity_for(ch) {
            Some(entity) => out.push_str(entity),
            None => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape_html`]. Only the eight table entities are decoded;
/// any other `&...;` sequence is left alone.
#[must_use]
pub fn unescape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match ENTITIES
            .iter()
            .find(|(_, entity)| rest.starts_with(entity))
        {
            Some((raw, entity)) => {
                out.push(*raw);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_full_table() {
        assert_eq!(
            escape_html(r#"&<>"'/`="#),
            "&amp;&lt;&gt;&quot;&#39;&#x2F;&#x60;&#x3D;"
        );
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(escape_html("plain text ünïcode"), "plain text ünïcode");
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn round_trip() {
        for input in [
            r#"<a href="/x?a=1&b='2'">`t`</a>"#,
            "&amp; already escaped",
            "no entities",
            "&&&;;",
        ] {
            assert_eq!(unescape_html(&escape_html(input)), input);
        }
    }

    #[test]
    fn unescape_ignores_unknown_entities() {
        assert_eq!(unescape_html("&nbsp;&lt;"), "&nbsp;<");
        assert_eq!(unescape_html("tail &"), "tail &");
    }
}
