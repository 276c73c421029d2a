//! CSV inspection tools exposed over the session transport.

use crate::dataset;
use crate::error::{Error, Result};
use crate::lookup::find_in_roots;
use crate::roots::{RootDirs, RootsSource};
use mcp::{CallToolResult, Peer, Tool, ToolHandler};
use serde_json::{Map, Value, json};
use std::path::PathBuf;

/// The CSV-info tool surface.
pub struct CsvInfo {
    roots: RootDirs,
}

impl CsvInfo {
    pub fn new(fallback_root: Option<PathBuf>) -> Self {
        Self {
            roots: RootDirs::new(fallback_root),
        }
    }

    /// Resolve directories, locate the file, and run the named tool.
    /// Every failure is a value-level error the caller folds into an
    /// `is_error` payload.
    async fn dispatch<S: RootsSource>(
        &self,
        name: &str,
        arguments: Option<Value>,
        peer: &S,
    ) -> Result<Value> {
        let file_path = arguments
            .as_ref()
            .and_then(|a| a.get("file_path"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::BadArguments("file_path is required".to_string()))?;

        let dirs = self.roots.resolve(peer).await?;
        let full_path = find_in_roots(file_path, &dirs).ok_or_else(|| Error::NotFound {
            path: file_path.to_string(),
            searched: dirs.to_vec(),
        })?;

        match name {
            "get_csv_schema" => {
                let schema = dataset::schema(&full_path)?;
                let map: Map<String, Value> = schema
                    .into_iter()
                    .map(|(column, inferred)| (column, Value::String(inferred.to_string())))
                    .collect();
                Ok(Value::Object(map))
            }
            "count_csv_rows" => Ok(json!(dataset::row_count(&full_path)?)),
            "count_csv_columns" => Ok(json!(dataset::columns(&full_path)?.len())),
            "read_csv_columns" => Ok(json!(dataset::columns(&full_path)?)),
            _ => Err(Error::UnknownTool(name.to_string())),
        }
    }
}

impl ToolHandler for CsvInfo {
    fn tools(&self) -> Vec<Tool> {
        tool_definitions()
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>, peer: &Peer) -> CallToolResult {
        match self.dispatch(name, arguments, peer).await {
            Ok(value) => {
                let text = match &value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                CallToolResult::structured(json!({ "result": value }), text)
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                CallToolResult::error(e.to_string())
            }
        }
    }
}

fn file_path_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "file_path": { "type": "string" } },
        "required": ["file_path"]
    })
}

fn tool_definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: "get_csv_schema".to_string(),
            description: Some(
                "Get the schema of a CSV file as a column to type-name mapping".to_string(),
            ),
            input_schema: file_path_schema(),
        },
        Tool {
            name: "count_csv_rows".to_string(),
            description: Some("Count the number of rows in a CSV file".to_string()),
            input_schema: file_path_schema(),
        },
        Tool {
            name: "count_csv_columns".to_string(),
            description: Some("Count the number of columns in a CSV file".to_string()),
            input_schema: file_path_schema(),
        },
        Tool {
            name: "read_csv_columns".to_string(),
            description: Some("Read a CSV file and return its column names".to_string()),
            input_schema: file_path_schema(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp::Root;
    use tempfile::TempDir;

    struct NoRootsClient;

    impl RootsSource for NoRootsClient {
        async fn supports_roots(&self) -> bool {
            false
        }

        async fn list_roots(&self) -> mcp::Result<Vec<Root>> {
            Ok(Vec::new())
        }
    }

    struct RootsClient(Vec<Root>);

    impl RootsSource for RootsClient {
        async fn supports_roots(&self) -> bool {
            true
        }

        async fn list_roots(&self) -> mcp::Result<Vec<Root>> {
            Ok(self.0.clone())
        }
    }

    fn sales_dir(rows: usize) -> TempDir {
        let dir = TempDir::new().unwrap();
        let mut contents = String::from("region,amount\n");
        for i in 0..rows {
            contents.push_str(&format!("region-{i},{i}\n"));
        }
        std::fs::write(dir.path().join("sales.csv"), contents).unwrap();
        dir
    }

    #[tokio::test]
    async fn count_rows_via_fallback_root() {
        let dir = sales_dir(42);
        let info = CsvInfo::new(Some(dir.path().to_path_buf()));

        let value = info
            .dispatch(
                "count_csv_rows",
                Some(json!({"file_path": "sales.csv"})),
                &NoRootsClient,
            )
            .await
            .unwrap();
        assert_eq!(value, json!(42));
    }

    #[tokio::test]
    async fn count_rows_via_negotiated_roots() {
        let dir = sales_dir(3);
        let client = RootsClient(vec![Root::from_path(dir.path())]);
        let info = CsvInfo::new(None);

        let value = info
            .dispatch(
                "count_csv_rows",
                Some(json!({"file_path": "sales.csv"})),
                &client,
            )
            .await
            .unwrap();
        assert_eq!(value, json!(3));
    }

    #[tokio::test]
    async fn schema_maps_columns_to_type_names() {
        let dir = sales_dir(2);
        let info = CsvInfo::new(Some(dir.path().to_path_buf()));

        let value = info
            .dispatch(
                "get_csv_schema",
                Some(json!({"file_path": "sales.csv"})),
                &NoRootsClient,
            )
            .await
            .unwrap();
        assert_eq!(value["region"], json!("String"));
        assert_eq!(value["amount"], json!("Int64"));
    }

    #[tokio::test]
    async fn column_tools_agree_on_the_header() {
        let dir = sales_dir(1);
        let info = CsvInfo::new(Some(dir.path().to_path_buf()));
        let args = || Some(json!({"file_path": "sales.csv"}));

        let count = info
            .dispatch("count_csv_columns", args(), &NoRootsClient)
            .await
            .unwrap();
        let names = info
            .dispatch("read_csv_columns", args(), &NoRootsClient)
            .await
            .unwrap();

        assert_eq!(count, json!(2));
        assert_eq!(names, json!(["region", "amount"]));
    }

    #[tokio::test]
    async fn missing_file_is_a_lookup_error() {
        let dir = sales_dir(1);
        let info = CsvInfo::new(Some(dir.path().to_path_buf()));

        let err = info
            .dispatch(
                "count_csv_rows",
                Some(json!({"file_path": "absent.csv"})),
                &NoRootsClient,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn unresolvable_roots_fail_the_invocation() {
        let info = CsvInfo::new(None);

        let err = info
            .dispatch(
                "count_csv_rows",
                Some(json!({"file_path": "sales.csv"})),
                &NoRootsClient,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoRoots));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let dir = sales_dir(1);
        let info = CsvInfo::new(Some(dir.path().to_path_buf()));

        let err = info
            .dispatch(
                "drop_csv_table",
                Some(json!({"file_path": "sales.csv"})),
                &NoRootsClient,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTool(_)));
    }

    #[tokio::test]
    async fn missing_file_path_argument_is_rejected() {
        let info = CsvInfo::new(None);

        let err = info
            .dispatch("count_csv_rows", Some(json!({})), &NoRootsClient)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadArguments(_)));
    }

    #[test]
    fn every_declared_tool_has_a_convertible_schema() {
        for tool in tool_definitions() {
            let schema = tool.input_schema.as_object().unwrap();
            assert!(schema.contains_key("required"), "{}", tool.name);
            assert!(schema.contains_key("properties"), "{}", tool.name);
        }
    }
}
