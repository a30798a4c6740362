//! Human-readable diffs for audit entries
//!
//! Only top-level fields are compared; nested values are summarised.

use serde::Serialize;
use serde_json::Value;

const MAX_STRING_CHARS: usize = 50;

/// `generate_diff` over two serializable snapshots
pub fn diff_entities<T: Serialize>(before: &T, after: &T) -> Option<String> {
    let before = serde_json::to_value(before).ok()?;
    let after = serde_json::to_value(after).ok()?;
    generate_diff(&before, &after)
}

/// Describe how `after` differs from `before`, or `None` if they are equal
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let changes = match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            let mut changes = Vec::new();

            for (key, before_val) in before_obj {
                match after_obj.get(key) {
                    Some(after_val) if after_val != before_val => changes.push(format!(
                        "{}: {} -> {}",
                        key,
                        format_value(before_val),
                        format_value(after_val)
                    )),
                    Some(_) => {}
                    None => changes.push(format!("{}: {} -> (removed)", key, format_value(before_val))),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    changes.push(format!("{}: (added) -> {}", key, format_value(after_val)));
                }
            }

            changes
        }
        _ if before != after => vec![format!("{} -> {}", format_value(before), format_value(after))],
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > MAX_STRING_CHARS => {
            let head: String = s.chars().take(MAX_STRING_CHARS - 3).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_balance_change() {
        let before = json!({"name": "Coffee", "remaining_value": 1000});
        let after = json!({"name": "Coffee", "remaining_value": 0});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(diff, "remaining_value: 1000 -> 0");
    }

    #[test]
    fn test_added_and_removed_fields() {
        let before = json!({"name": "Test", "category": "Food"});
        let after = json!({"name": "Test", "description": "note"});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("category: \"Food\" -> (removed)"));
        assert!(diff.contains("description: (added) -> \"note\""));
    }

    #[test]
    fn test_diff_entities() {
        #[derive(Serialize)]
        struct Card {
            name: &'static str,
            value: i64,
        }
        let diff = diff_entities(&Card { name: "A", value: 5 }, &Card { name: "A", value: 2 });
        assert_eq!(diff.as_deref(), Some("value: 5 -> 2"));
    }

    #[test]
    fn test_no_changes() {
        let value = json!({"name": "Test", "value": 100});
        assert!(generate_diff(&value, &value).is_none());
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(
            generate_diff(&json!("USD"), &json!("EUR")).unwrap(),
            "\"USD\" -> \"EUR\""
        );
    }

    #[test]
    fn test_collections_are_summarised() {
        let before = json!({"conditions": [1, 2], "meta": {"a": 1}});
        let after = json!({"conditions": [1, 2, 3], "meta": {"a": 2, "b": 3}});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("conditions: [2 items] -> [3 items]"));
        assert!(diff.contains("meta: {1 fields} -> {2 fields}"));
    }

    #[test]
    fn test_long_multibyte_string_truncation() {
        let before = json!({"description": "€".repeat(80)});
        let after = json!({"description": "short"});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("...\""));
    }
}
