use std::borrow::Cow;

/// Placeholder syntax a backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style numbered placeholders like `$1`.
    Numbered,
}

/// Rewrite `?`-style placeholders for the target style.
///
/// Each bare `?` becomes the next `$n`, an explicit `?N` becomes `$N`, and `??` collapses to a
/// literal `?` (for operators such as jsonb `?|`). Placeholders inside quoted strings, quoted
/// identifiers, comments and dollar-quoted blocks are left alone.
///
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_placeholders(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    let PlaceholderStyle::Numbered = target;

    let bytes = sql.as_bytes();
    let mut out: Option<Vec<u8>> = None;
    let mut state = State::Normal;
    let mut next_bare = 1usize;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        let mut replacement: Option<(String, usize)> = None;
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    copy_through(&mut out, bytes, idx, idx + 2);
                    idx += 2;
                    continue;
                }
                b'$' => {
                    if let Some((tag, end)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        copy_through(&mut out, bytes, idx, end + 1);
                        idx = end + 1;
                        continue;
                    }
                }
                b'?' => {
                    if bytes.get(idx + 1) == Some(&b'?') {
                        replacement = Some(("?".to_string(), idx + 2));
                    } else if let Some((digits_end, digits)) = scan_digits(bytes, idx + 1) {
                        replacement = Some((format!("${digits}"), digits_end));
                    } else {
                        replacement = Some((format!("${next_bare}"), idx + 1));
                        next_bare += 1;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        copy_through(&mut out, bytes, idx, idx + 2);
                        idx += 2;
                        continue;
                    }
                    state = State::Normal;
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        copy_through(&mut out, bytes, idx, idx + 2);
                        idx += 2;
                        continue;
                    }
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    copy_through(&mut out, bytes, idx, idx + 2);
                    idx += 2;
                    continue;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    copy_through(&mut out, bytes, idx, idx + 2);
                    idx += 2;
                    continue;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let end = idx + tag.len() + 2;
                    state = State::Normal;
                    copy_through(&mut out, bytes, idx, end);
                    idx = end;
                    continue;
                }
            }
        }

        match replacement {
            Some((text, resume)) => {
                let buf = out.get_or_insert_with(|| bytes[..idx].to_vec());
                buf.extend_from_slice(text.as_bytes());
                idx = resume;
            }
            None => {
                if let Some(buf) = out.as_mut() {
                    buf.push(b);
                }
                idx += 1;
            }
        }
    }

    match out {
        // Only ASCII was spliced in between untouched UTF-8 runs.
        Some(buf) => Cow::Owned(String::from_utf8_lossy(&buf).into_owned()),
        None => Cow::Borrowed(sql),
    }
}

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

fn copy_through(out: &mut Option<Vec<u8>>, bytes: &[u8], from: usize, to: usize) {
    if let Some(buf) = out.as_mut() {
        buf.extend_from_slice(&bytes[from..to.min(bytes.len())]);
    }
}

fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|digits| (idx, digits))
    }
}

/// Returns the tag and the index of the closing `$` of an opening `$tag$`.
fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphabetic() || b == b'_' || (idx > start + 1 && b.is_ascii_digit())) {
            return None;
        }
        idx += 1;
    }

    if idx < bytes.len() && bytes[idx] == b'$' {
        let tag = String::from_utf8(bytes[start + 1..idx].to_vec()).ok()?;
        Some((tag, idx))
    } else {
        None
    }
}

fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..end] == *tag.as_bytes()
        && bytes.get(end) == Some(&b'$')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(sql: &str) -> Cow<'_, str> {
        translate_placeholders(sql, PlaceholderStyle::Numbered)
    }

    #[test]
    fn numbers_bare_placeholders_in_order() {
        let res = numbered("UPDATE users SET status = ? WHERE (en_name = ? AND id > ?)");
        assert_eq!(res, "UPDATE users SET status = $1 WHERE (en_name = $2 AND id > $3)");
    }

    #[test]
    fn keeps_explicit_indexes() {
        assert_eq!(numbered("select * from t where a = ?1 and b = ?2"), "select * from t where a = $1 and b = $2");
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select '?', \"col?\" -- ?\n/* ? */ from t where a = ?";
        assert_eq!(numbered(sql), "select '?', \"col?\" -- ?\n/* ? */ from t where a = $1");
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "$foo$ select ? from t $foo$ where a = ?";
        assert_eq!(numbered(sql), "$foo$ select ? from t $foo$ where a = $1");
    }

    #[test]
    fn doubled_question_mark_is_literal() {
        assert_eq!(numbered("select data ?? 'k' from t where id = ?"), "select data ? 'k' from t where id = $1");
    }

    #[test]
    fn untouched_sql_is_borrowed() {
        let sql = "select * from t where name = 'é?'";
        assert!(matches!(numbered(sql), Cow::Borrowed(_)));
    }

    #[test]
    fn preserves_multibyte_text() {
        assert_eq!(numbered("select 'ñandú' from t where a = ?"), "select 'ñandú' from t where a = $1");
    }
}
