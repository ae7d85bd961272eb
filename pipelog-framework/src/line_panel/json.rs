//! Parsing, printing and dropping JSON values without recursing per level.
//!
//! `serde_json` recurses once per nesting level when it parses, prints or
//! drops a `Value`. Parsing runs on a stack that grows on demand; printing
//! and dropping walk an explicit work list instead.

use serde::Deserialize;
use serde_json::Value;

/// documents nested deeper than this are not rendered as JSON
pub const MAX_NESTING: usize = 1000;

const INDENT: &str = "  ";

/// Parse `line` as exactly one JSON document.
pub fn parse(line: &str) -> Option<Value> {
    if nesting_depth(line) > MAX_NESTING {
        return None;
    }

    let mut de = serde_json::Deserializer::from_str(line);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de)).ok()?;

    if de.end().is_err() {
        dismantle(value);
        return None;
    }
    Some(value)
}

// deepest bracket nesting outside of string literals; input need not be valid
fn nesting_depth(text: &str) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);

    for b in text.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    deepest
}

enum Piece<'a> {
    Value(&'a Value, usize),
    Key(&'a str),
    Text(&'static str),
    Indent(usize),
}

/// Same output as `serde_json::to_string_pretty`.
pub fn to_pretty(root: &Value) -> Option<String> {
    let mut out = String::new();
    let mut pending = vec![Piece::Value(root, 0)];

    while let Some(piece) = pending.pop() {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Indent(depth) => {
                for _ in 0..depth {
                    out.push_str(INDENT);
                }
            }
            Piece::Key(key) => out.push_str(&serde_json::to_string(key).ok()?),
            Piece::Value(Value::Array(items), depth) if !items.is_empty() => {
                let mut pieces = vec![Piece::Text("[\n")];
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        pieces.push(Piece::Text(",\n"));
                    }
                    pieces.push(Piece::Indent(depth + 1));
                    pieces.push(Piece::Value(item, depth + 1));
                }
                pieces.extend([Piece::Text("\n"), Piece::Indent(depth), Piece::Text("]")]);
                pending.extend(pieces.into_iter().rev());
            }
            Piece::Value(Value::Object(map), depth) if !map.is_empty() => {
                let mut pieces = vec![Piece::Text("{\n")];
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        pieces.push(Piece::Text(",\n"));
                    }
                    pieces.push(Piece::Indent(depth + 1));
                    pieces.push(Piece::Key(key));
                    pieces.push(Piece::Text(": "));
                    pieces.push(Piece::Value(item, depth + 1));
                }
                pieces.extend([Piece::Text("\n"), Piece::Indent(depth), Piece::Text("}")]);
                pending.extend(pieces.into_iter().rev());
            }
            // scalars and empty containers
            Piece::Value(value, _) => out.push_str(&serde_json::to_string(value).ok()?),
        }
    }

    Some(out)
}

/// Drop `value` one container at a time.
pub fn dismantle(value: Value) {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested(depth: usize) -> String {
        format!("{}\"x\"{}", "[".repeat(depth), "]".repeat(depth))
    }

    #[test]
    fn test_pretty_matches_serde_json() {
        let line = r#"{"b": [1, 2.50, {"c": null, "d": []}], "a": {}, "s": "q\"\u0001é", "t": true}"#;
        let value = parse(line).unwrap();
        assert_eq!(
            to_pretty(&value).unwrap(),
            serde_json::to_string_pretty(&value).unwrap()
        );
    }

    #[test]
    fn test_scalars_and_empty_containers() {
        for line in ["42", "\"s\"", "null", "[]", "{}"] {
            assert_eq!(to_pretty(&parse(line).unwrap()).unwrap(), line);
        }
    }

    #[test]
    fn test_parse_beyond_default_recursion_limit() {
        let value = parse(&nested(MAX_NESTING)).unwrap();
        let text = to_pretty(&value).unwrap();
        assert_eq!(text.lines().count(), 2 * MAX_NESTING + 1);
        dismantle(value);
    }

    #[test]
    fn test_nesting_cap() {
        assert!(parse(&nested(MAX_NESTING + 1)).is_none());
    }

    #[test]
    fn test_brackets_in_strings_do_not_count() {
        assert_eq!(nesting_depth(r#"["[[[\"{{", {"k": "]]"}]"#), 2);
        assert_eq!(nesting_depth("plain text"), 0);
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert!(parse(r#"{"a": 1} extra"#).is_none());
        assert!(parse(&format!("{} ,", nested(500))).is_none());
        assert!(parse("").is_none());
    }

    fn nested_value(depth: usize) -> Value {
        let mut value = Value::Null;
        for _ in 0..depth {
            value = Value::Array(vec![value]);
        }
        value
    }

    #[test]
    fn test_pretty_walk_is_iterative() {
        let value = nested_value(2_500);
        let text = to_pretty(&value).unwrap();
        assert!(text.starts_with("[\n  [\n"));
        assert_eq!(text.lines().count(), 5_001);
        dismantle(value);
    }

    #[test]
    fn test_dismantle_is_iterative() {
        dismantle(nested_value(200_000));
    }
}
