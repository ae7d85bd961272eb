use std::borrow::Cow;

/// Decode backslash escapes into the characters they stand for.
///
/// Handles the single-character escapes (`\n`, `\t`, `\r`, `\\`, `\'`, `\"`,
/// `\a`, `\b`, `\f`, `\v`), octal (`\7`, `\07`, `\007`), `\xhh`, `\uXXXX`
/// (a high/low surrogate pair written as two `\u` escapes is combined),
/// `\UXXXXXXXX`, and a backslash before a line break, which is dropped along
/// with the break.
///
/// Anything else is left as written, backslash included: unknown escapes,
/// named escapes such as `\N{BULLET}` (there is no name table), truncated
/// hex sequences, lone surrogates and a trailing backslash. The
/// function never fails, and returns the input unchanged (borrowed) when it
/// contains no backslash.
pub fn unescape(input: &str) -> Cow<'_, str> {
    if !input.contains('\\') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let escape = &rest[pos + 1..];

        match decode_escape(escape) {
            Some((decoded, consumed)) => {
                if let Some(c) = decoded {
                    out.push(c);
                }
                rest = &escape[consumed..];
            }
            None => {
                out.push('\\');
                rest = escape;
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// decode the escape following a backslash
///
/// returns the decoded char (None for a line continuation) and the number of
/// bytes consumed after the backslash, or None when `s` does not start with a
/// valid escape
fn decode_escape(s: &str) -> Option<(Option<char>, usize)> {
    let first = s.chars().next()?;

    let simple = match first {
        '\n' => return Some((None, 1)),
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'v' => '\x0b',
        '0'..='7' => return decode_octal(s),
        'x' => {
            let value = hex_value(&s[1..], 2)?;
            return char::from_u32(value).map(|c| (Some(c), 3));
        }
        'u' => return decode_utf16_escape(s),
        'U' => {
            let value = hex_value(&s[1..], 8)?;
            return char::from_u32(value).map(|c| (Some(c), 9));
        }
        _ => return None,
    };

    Some((Some(simple), 1))
}

fn decode_octal(s: &str) -> Option<(Option<char>, usize)> {
    let digits = s
        .bytes()
        .take(3)
        .take_while(|b| (b'0'..=b'7').contains(b))
        .count();
    let value = u32::from_str_radix(&s[..digits], 8).ok()?;
    char::from_u32(value).map(|c| (Some(c), digits))
}

// `s` starts at the `u`
fn decode_utf16_escape(s: &str) -> Option<(Option<char>, usize)> {
    let unit = hex_value(&s[1..], 4)?;

    match unit {
        0xD800..=0xDBFF => {
            let low = s
                .get(5..)
                .and_then(|tail| tail.strip_prefix("\\u"))
                .and_then(|tail| hex_value(tail, 4))
                .filter(|low| (0xDC00..=0xDFFF).contains(low))?;
            let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            char::from_u32(combined).map(|c| (Some(c), 11))
        }
        0xDC00..=0xDFFF => None,
        _ => char::from_u32(unit).map(|c| (Some(c), 5)),
    }
}

fn hex_value(s: &str, len: usize) -> Option<u32> {
    let digits = s.get(..len)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
