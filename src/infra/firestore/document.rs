//! Conversion between plain values and Firestore's typed REST JSON.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

pub fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

pub fn boolean_value(b: bool) -> Value {
    json!({ "booleanValue": b })
}

/// A document as returned by `runQuery`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Reads a document out of one `runQuery` result row. Rows without a
    /// `document` (the trailing read-time marker on empty results) give `None`.
    pub fn from_query_row(row: &Value) -> Option<Self> {
        let doc = row.get("document")?;
        let name = doc.get("name")?.as_str()?.to_string();
        let fields = doc
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(Self { name, fields })
    }

    /// The final path segment of the document name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn string(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.get("stringValue")?.as_str()
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.fields.get(field)?.get("booleanValue")?.as_bool()
    }

    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        let raw = self.fields.get(field)?.get("timestampValue")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Value {
        json!({
            "document": {
                "name": "projects/p/databases/(default)/documents/reports/abc123",
                "fields": {
                    "locationName": { "stringValue": "Chick-fil-A" },
                    "isLong": { "booleanValue": true },
                    "timestamp": { "timestampValue": "2025-03-01T12:30:00.123456Z" }
                },
                "createTime": "2025-03-01T12:30:00.123456Z"
            },
            "readTime": "2025-03-01T12:31:00Z"
        })
    }

    #[test]
    fn test_reads_typed_fields() {
        let doc = Document::from_query_row(&row()).unwrap();
        assert_eq!(doc.id(), "abc123");
        assert_eq!(doc.string("locationName"), Some("Chick-fil-A"));
        assert_eq!(doc.boolean("isLong"), Some(true));
        let ts = doc.timestamp("timestamp").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-03-01T12:30:00.123456+00:00");
    }

    #[test]
    fn test_wrong_type_is_none() {
        let doc = Document::from_query_row(&row()).unwrap();
        assert_eq!(doc.boolean("locationName"), None);
        assert_eq!(doc.timestamp("missing"), None);
    }

    #[test]
    fn test_read_time_only_row_is_skipped() {
        assert!(Document::from_query_row(&json!({ "readTime": "2025-03-01T12:31:00Z" })).is_none());
    }

    #[test]
    fn test_value_builders() {
        assert_eq!(string_value("x"), json!({ "stringValue": "x" }));
        assert_eq!(boolean_value(false), json!({ "booleanValue": false }));
    }
}
