//! Wire types of the GA4GH Search REST API.
use crate::pagination::PageEnvelope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A JSON row returned by the search backend.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The `pagination` block every paginated response carries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next_page_url: Option<String>,
}

/// Link to the JSON schema describing a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModelRef {
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// One table exposed by the backend, as listed by `GET {base}tables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    pub name: String,
    pub data_model: DataModelRef,
}

/// A single property declared by a table schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSpec {
    /// Either a type name or a list of them (`["string", "null"]`).
    #[serde(rename = "type", default)]
    pub kind: serde_json::Value,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(rename = "$comment", default)]
    pub hint: Option<String>,
}

impl FieldSpec {
    /// The declared type name. For a list of types the first non-`null` entry wins; an
    /// undeclared type is the empty string.
    pub fn type_name(&self) -> String {
        match &self.kind {
            serde_json::Value::String(name) => name.clone(),
            serde_json::Value::Array(names) => names
                .iter()
                .filter_map(serde_json::Value::as_str)
                .find(|name| *name != "null")
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }
}

/// The JSON schema document a table's `data_model.$ref` points at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDocument {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "$schema", alias = "schema", default)]
    pub schema: String,
    #[serde(default)]
    pub properties: BTreeMap<String, FieldSpec>,
}

/// Some backends answer the schema link with a table info object that nests the schema
/// under `data_model` instead of returning the schema itself.
#[derive(Debug, Deserialize)]
pub(crate) struct SchemaResponse {
    #[serde(flatten)]
    document: SchemaDocument,
    #[serde(default)]
    data_model: Option<SchemaDocument>,
}

impl From<SchemaResponse> for SchemaDocument {
    fn from(response: SchemaResponse) -> Self {
        match response.data_model {
            Some(nested) if response.document.properties.is_empty() => nested,
            _ => response.document,
        }
    }
}

/// Body of a `POST {base}search` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub parameters: Vec<String>,
}

impl SearchQuery {
    /// Selects the rows of `table` whose `field` equals `value`.
    ///
    /// The value travels as a positional parameter and is never spliced into the SQL text.
    pub fn field_equals(table: &str, field: &str, value: &str) -> Self {
        Self {
            query: format!("SELECT * FROM {table} WHERE {field} = ?"),
            parameters: vec![value.to_string()],
        }
    }
}

/// A response envelope that carries one page of items.
pub trait Paged {
    type Item;

    fn into_page(self) -> PageEnvelope<Self::Item>;
}

/// Response of `GET {base}tables`.
#[derive(Debug, Deserialize)]
pub struct TablesResponse {
    #[serde(default)]
    pub tables: Vec<CollectionDescriptor>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl Paged for TablesResponse {
    type Item = CollectionDescriptor;

    fn into_page(self) -> PageEnvelope<CollectionDescriptor> {
        PageEnvelope {
            items: self.tables,
            next_page_url: self.pagination.and_then(|p| p.next_page_url),
        }
    }
}

/// Response of `GET {base}table/{name}/data` and `POST {base}search`.
#[derive(Debug, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub data_model: Option<serde_json::Value>,
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl Paged for QueryResult {
    type Item = Record;

    fn into_page(self) -> PageEnvelope<Record> {
        PageEnvelope {
            items: self.data,
            next_page_url: self.pagination.and_then(|p| p.next_page_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_query_is_parameterized() {
        let query = SearchQuery::field_equals("patients", "id", "x' OR '1'='1");

        assert_eq!(query.query, "SELECT * FROM patients WHERE id = ?");
        assert_eq!(query.parameters, vec!["x' OR '1'='1"]);
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "query": "SELECT * FROM patients WHERE id = ?",
                "parameters": ["x' OR '1'='1"]
            })
        );
    }

    #[test]
    fn test_collection_descriptor_keeps_ref_name() {
        let table = CollectionDescriptor {
            name: "patients".to_string(),
            data_model: DataModelRef {
                reference: "http://x/schema/patients".to_string(),
            },
        };

        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"{"name":"patients","data_model":{"$ref":"http://x/schema/patients"}}"#
        );
    }

    #[test]
    fn test_field_type_name() {
        let spec = |kind| FieldSpec {
            kind,
            ..Default::default()
        };

        assert_eq!(spec(json!("integer")).type_name(), "integer");
        assert_eq!(spec(json!(["null", "string"])).type_name(), "string");
        assert_eq!(spec(json!(null)).type_name(), "");
    }

    #[test]
    fn test_schema_properties_at_top_level() {
        let response: SchemaResponse = serde_json::from_value(json!({
            "$id": "http://x/schema/patients",
            "description": "Patients",
            "$schema": "http://json-schema.org/draft-07/schema#",
            "properties": {
                "id": { "type": "string", "$comment": "primary" },
                "age": { "type": "integer", "format": "int32" }
            }
        }))
        .unwrap();

        let schema = SchemaDocument::from(response);

        assert_eq!(schema.id, "http://x/schema/patients");
        assert_eq!(schema.properties.len(), 2);
        assert_eq!(schema.properties["id"].hint.as_deref(), Some("primary"));
        assert_eq!(schema.properties["age"].format.as_deref(), Some("int32"));
    }

    #[test]
    fn test_schema_properties_nested_in_data_model() {
        let response: SchemaResponse = serde_json::from_value(json!({
            "name": "patients",
            "description": "Patients table",
            "data_model": {
                "$id": "patients",
                "properties": { "id": { "type": "string" } }
            }
        }))
        .unwrap();

        let schema = SchemaDocument::from(response);

        assert_eq!(schema.id, "patients");
        assert!(schema.properties.contains_key("id"));
    }

    #[test]
    fn test_missing_pagination_ends_page() {
        let result: QueryResult = serde_json::from_value(json!({
            "data_model": {},
            "data": [{ "id": "a" }]
        }))
        .unwrap();

        let page = result.into_page();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_page_url, None);
    }
}
