//! Response models for the Appwrite Databases API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document returned by Appwrite.
///
/// Appwrite prefixes its own metadata with `$`; everything else is the
/// collection's attribute payload and lands in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,

    #[serde(rename = "$collectionId", default)]
    pub collection_id: Option<String>,

    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<String>,

    #[serde(rename = "$updatedAt", default)]
    pub updated_at: Option<String>,

    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    /// Read a string attribute. Missing, null and non-string values all
    /// come back as `None`; callers decide how to default.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// A page of documents plus the collection's total count.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_splits_metadata_from_attributes() {
        let doc: Document = serde_json::from_str(
            r#"{
                "$id": "abc123",
                "$collectionId": "clientes",
                "$createdAt": "2024-01-15T10:00:00.000+00:00",
                "$updatedAt": "2024-01-15T10:00:00.000+00:00",
                "nombre_completo": "Ana García",
                "edad": 42
            }"#,
        )
        .unwrap();

        assert_eq!(doc.id, "abc123");
        assert_eq!(doc.get_str("nombre_completo"), Some("Ana García"));
        // Non-string attributes are present in data but not as strings
        assert_eq!(doc.get_str("edad"), None);
        assert_eq!(doc.data.get("edad").and_then(Value::as_i64), Some(42));
    }

    #[test]
    fn test_document_list_deserializes() {
        let list: DocumentList = serde_json::from_str(
            r#"{"total": 2, "documents": [{"$id": "a"}, {"$id": "b"}]}"#,
        )
        .unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.documents.len(), 2);
    }
}
