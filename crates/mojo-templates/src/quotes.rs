/// Find positions of a delimiter character in `s` that sit at the top level:
/// outside single- or double-quoted regions and at parenthesis depth zero.
///
/// A `\` inside a quoted region escapes the next character. Unbalanced
/// closing parens never push the depth below zero.
///
/// The callback receives the byte index of each top-level delimiter found.
/// Return `true` from the callback to stop early.
pub(crate) fn for_each_top_level(
    s: &str,
    delimiter: impl Fn(char) -> bool,
    mut cb: impl FnMut(usize) -> bool,
) {
    let mut quote: Option<char> = None;
    let mut escape = false;
    let mut depth = 0usize;

    for (idx, ch) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if quote.is_some() => {
                escape = true;
            }
            '"' | '\'' if quote == Some(ch) => {
                quote = None;
            }
            '"' | '\'' if quote.is_none() => {
                quote = Some(ch);
            }
            _ if quote.is_some() => {}
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 && delimiter(ch) => {
                if cb(idx) {
                    return;
                }
            }
            _ => {}
        }
    }
}

/// Split `s` on every top-level occurrence of `delimiter`.
pub(crate) fn split_top_level(s: &str, delimiter: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for_each_top_level(
        s,
        |ch| ch == delimiter,
        |idx| {
            pieces.push(&s[start..idx]);
            start = idx + delimiter.len_utf8();
            false
        },
    );

    pieces.push(&s[start..]);
    pieces
}

/// Strip one layer of matching quotes and resolve backslash escapes.
///
/// Returns `None` when `s` is not a quoted literal.
pub(crate) fn unquote(s: &str) -> Option<String> {
    let mut chars = s.chars();
    let open = chars.next()?;
    if !matches!(open, '"' | '\'') || s.len() < 2 || !s.ends_with(open) {
        return None;
    }

    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut escape = false;
    for ch in inner.chars() {
        if escape {
            out.push(ch);
            escape = false;
        } else if ch == '\\' {
            escape = true;
        } else {
            out.push(ch);
        }
    }
    Some(out)
}
