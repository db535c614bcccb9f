//! Schema introspection contract.
//!
//! The metadata endpoint of the platform returns the tables and columns a
//! tenant's database exposes. This crate only consumes the payload: editors
//! use it to populate table/column pickers and the database-operation
//! validator uses it for advisory warnings.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The introspected schema of a tenant database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    /// Schema name, e.g. `public`.
    pub schema: String,
    #[serde(default)]
    pub tables: Vec<TableInfo>,
}

impl SchemaCatalog {
    /// Looks up a table by exact name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Table names in catalog order, for pickers.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.table.as_str())
    }
}

/// A single introspected table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub table: String,
    /// E.g. `BASE TABLE` or `VIEW`.
    #[serde(default)]
    pub table_type: String,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    /// Looks up a column by exact name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// A single introspected column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_deserializes_endpoint_payload() {
        let json = r#"{
            "schema": "public",
            "tables": [{
                "table": "leave_requests",
                "tableType": "BASE TABLE",
                "columns": [
                    {"name": "id", "type": "integer", "nullable": false, "default": null},
                    {"name": "status", "type": "text", "nullable": true}
                ]
            }]
        }"#;
        let catalog: SchemaCatalog = serde_json::from_str(json).expect("deserialize");
        assert_eq!(catalog.schema, "public");

        let table = catalog.table("leave_requests").expect("table");
        assert_eq!(table.table_type, "BASE TABLE");
        assert!(table.has_column("status"));
        assert!(!table.has_column("approver"));
        assert_eq!(table.column("id").expect("column").data_type, "integer");
    }

    #[test]
    fn table_lookup_is_exact() {
        let catalog = SchemaCatalog {
            schema: "public".into(),
            tables: vec![TableInfo {
                table: "employees".into(),
                table_type: String::new(),
                columns: vec![],
            }],
        };
        assert!(catalog.table("employees").is_some());
        assert!(catalog.table("Employees").is_none());
        assert_eq!(catalog.table_names().collect::<Vec<_>>(), vec!["employees"]);
    }
}
