//! Tool definition helpers and the Ollama wire format.

use serde_json::{json, Value};

use crate::ToolDefinition;

/// Convert a [`ToolDefinition`] to the Ollama `tools` entry format.
pub fn to_ollama_tool(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

/// JSON schema for an object with string properties.
///
/// `properties` is a list of `(name, description)` pairs; `required` names
/// the subset the model must always supply.
pub fn object_schema(properties: &[(&str, &str)], required: &[&str]) -> Value {
    let props: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                json!({ "type": "string", "description": description }),
            )
        })
        .collect();
    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_format_wraps_function() {
        let def = ToolDefinition {
            name: "list_database_tables".into(),
            description: "List tables".into(),
            parameters: object_schema(&[], &[]),
        };
        let json = to_ollama_tool(&def);
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "list_database_tables");
        assert_eq!(json["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn object_schema_lists_properties_and_required() {
        let schema = object_schema(&[("table_name", "Name of the table")], &["table_name"]);
        assert_eq!(schema["properties"]["table_name"]["type"], "string");
        assert_eq!(schema["required"][0], "table_name");
    }
}
