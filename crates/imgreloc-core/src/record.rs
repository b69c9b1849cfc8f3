//! Read access to the fields of the record being processed.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

/// Read-only view of the current record's fields.
///
/// Used to resolve path prefixes configured as `{ field = "..." }`.
pub trait RecordFields {
    /// String value of a field, or `None` if absent or not a string.
    fn field(&self, name: &str) -> Option<&str>;
}

/// Record without fields, for transforms that only use static prefixes.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyRecord;

impl RecordFields for EmptyRecord {
    fn field(&self, _name: &str) -> Option<&str> {
        None
    }
}

impl RecordFields for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl RecordFields for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl RecordFields for Map<String, Value> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_record() {
        assert_eq!(EmptyRecord.field("anything"), None);
    }

    #[test]
    fn test_hash_map_record() {
        let record = HashMap::from([("root".to_owned(), "/srv/media".to_owned())]);

        assert_eq!(record.field("root"), Some("/srv/media"));
        assert_eq!(record.field("other"), None);
    }

    #[test]
    fn test_json_record_only_exposes_strings() {
        let Value::Object(record) = json!({"root": "/srv/media", "count": 3}) else {
            unreachable!()
        };

        assert_eq!(record.field("root"), Some("/srv/media"));
        assert_eq!(record.field("count"), None);
        assert_eq!(record.field("missing"), None);
    }
}
