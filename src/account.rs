use serde::Deserialize;
use serde_json::Value;

/// A sub-account visible from the customer hub.
///
/// The API is inconsistent about id types (strings in some listings,
/// integers in others), so the id is kept as raw JSON and rendered on
/// demand.
#[derive(Deserialize, Debug, Clone)]
pub struct Account {
    pub id: Value,
    pub name: String,
}

impl Account {
    pub fn id_str(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// The one bounds predicate used for account selection.
pub fn index_in_range(index: usize, count: usize) -> bool {
    index < count
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn index_bounds() {
        assert!(index_in_range(0, 3));
        assert!(index_in_range(2, 3));
        assert!(!index_in_range(3, 3));
        assert!(!index_in_range(0, 0));
    }

    #[test]
    fn id_renders_without_quotes() {
        let by_string: Account = serde_json::from_value(json!({
            "id": "abc123",
            "name": "North Branch",
            "status": "active",
        }))
        .unwrap();
        assert_eq!(by_string.id_str(), "abc123");

        let by_number: Account = serde_json::from_value(json!({
            "id": 42,
            "name": "South Branch",
        }))
        .unwrap();
        assert_eq!(by_number.id_str(), "42");
    }
}
