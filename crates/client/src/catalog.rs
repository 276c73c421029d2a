//! Tool catalog adapter: MCP descriptors to chat-endpoint declarations.

use crate::ollama::{FunctionParameters, OllamaFunction, OllamaTool, PropertyType};
use mcp::Tool;
use serde_json::Value;
use std::collections::BTreeMap;

/// Convert one tool descriptor to the endpoint's function-calling form.
///
/// Only the per-property `type` survives the conversion; nested schema
/// attributes, enums, and per-property descriptions are dropped. That is a
/// deliberate narrowing: the endpoint needs argument names and types, not
/// the full schema. A descriptor whose schema lacks a `required` list or a
/// `properties` map is not convertible and yields `None`; callers omit it
/// from the catalog.
pub fn ollama_tool(tool: &Tool) -> Option<OllamaTool> {
    let schema = tool.input_schema.as_object()?;

    let required = schema
        .get("required")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect();

    let properties: BTreeMap<String, PropertyType> = schema
        .get("properties")?
        .as_object()?
        .iter()
        .map(|(name, prop)| {
            let type_name = prop
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("string")
                .to_string();
            (name.clone(), PropertyType { type_name })
        })
        .collect();

    Some(OllamaTool {
        kind: "function",
        function: OllamaFunction {
            name: tool.name.clone(),
            description: tool.description.clone().unwrap_or_default(),
            parameters: FunctionParameters {
                required,
                properties,
            },
        },
    })
}

/// Convert a full catalog, omitting descriptors that cannot be expressed.
pub fn catalog(tools: &[Tool]) -> Vec<OllamaTool> {
    tools
        .iter()
        .filter_map(|tool| {
            let converted = ollama_tool(tool);
            if converted.is_none() {
                tracing::warn!(tool = %tool.name, "skipping tool with malformed input schema");
            }
            converted
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(input_schema: Value) -> Tool {
        Tool {
            name: "count_csv_rows".to_string(),
            description: Some("Count the number of rows in a CSV file".to_string()),
            input_schema,
        }
    }

    #[test]
    fn required_names_are_a_subset_of_exposed_properties() {
        let tool = descriptor(json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string" },
                "delimiter": { "type": "string" }
            },
            "required": ["file_path"]
        }));

        let converted = ollama_tool(&tool).unwrap();
        for name in &converted.function.parameters.required {
            assert!(converted.function.parameters.properties.contains_key(name));
        }
        assert_eq!(
            converted.function.parameters.properties["file_path"].type_name,
            "string"
        );
    }

    #[test]
    fn schema_without_required_list_is_not_convertible() {
        let tool = descriptor(json!({
            "type": "object",
            "properties": { "file_path": { "type": "string" } }
        }));
        assert!(ollama_tool(&tool).is_none());
    }

    #[test]
    fn schema_without_properties_is_not_convertible() {
        let tool = descriptor(json!({ "type": "object", "required": ["file_path"] }));
        assert!(ollama_tool(&tool).is_none());
    }

    #[test]
    fn catalog_omits_malformed_descriptors() {
        let good = descriptor(json!({
            "type": "object",
            "properties": { "file_path": { "type": "string" } },
            "required": ["file_path"]
        }));
        let bad = descriptor(json!({ "type": "object" }));

        let converted = catalog(&[good, bad]);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].function.name, "count_csv_rows");
    }

    #[test]
    fn nested_schema_attributes_are_dropped() {
        let tool = descriptor(json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Relative path",
                    "minLength": 1
                }
            },
            "required": ["file_path"]
        }));

        let converted = ollama_tool(&tool).unwrap();
        let value = serde_json::to_value(&converted).unwrap();
        assert_eq!(
            value["function"]["parameters"]["properties"]["file_path"],
            json!({ "type": "string" })
        );
    }
}
