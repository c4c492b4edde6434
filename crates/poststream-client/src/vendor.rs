//! Reshapes the server's tool catalogue for chat-completion SDKs.
//!
//! Most AI SDKs accept tool declarations as plain JSON of the form
//! `{"type": "function", "function": {name, description, parameters}}`. The
//! adapter fetches the catalogue once and produces that shape, normalizing
//! the input schemas along the way. Pure data transformation; no SDK
//! dependency.

use serde_json::{Map, Value, json};

use crate::client::Client;
use crate::error::ClientError;

impl Client {
    /// Fetch the server's tool catalogue and reshape every descriptor into
    /// the chat-completion function format.
    pub async fn chat_completion_tools(&self) -> Result<Vec<Value>, ClientError> {
        let result = self.request("tools/list", Some(json!({}))).await?;
        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .ok_or_else(|| ClientError::ToolCatalogue("missing tools array".to_owned()))?;

        tools
            .iter()
            .map(|tool| {
                let tool = tool
                    .as_object()
                    .ok_or_else(|| ClientError::ToolCatalogue("tool is not an object".to_owned()))?;
                if !tool.get("name").is_some_and(Value::is_string) {
                    return Err(ClientError::ToolCatalogue(
                        "tool descriptor missing name".to_owned(),
                    ));
                }
                Ok(tool_to_function(tool))
            })
            .collect()
    }
}

/// Wrap one tool descriptor into the function declaration shape.
fn tool_to_function(tool: &Map<String, Value>) -> Value {
    let parameters = tool
        .get("inputSchema")
        .map(normalize_schema)
        .unwrap_or_else(|| json!({"type": "object"}));
    json!({
        "type": "function",
        "function": {
            "name": tool.get("name").cloned().unwrap_or(Value::Null),
            "description": tool.get("description").cloned().unwrap_or(Value::Null),
            "parameters": parameters,
        }
    })
}

/// Normalize an input schema for SDK consumption.
///
/// Drops `annotations` and `outputSchema`, supplies a default string `items`
/// for array schemas lacking one, and recurses into object properties.
fn normalize_schema(schema: &Value) -> Value {
    let Some(object) = schema.as_object() else {
        return schema.clone();
    };

    let mut result = Map::new();
    for (key, value) in object {
        if key == "annotations" || key == "outputSchema" {
            continue;
        }
        result.insert(key.clone(), value.clone());
    }

    match object.get("type").and_then(Value::as_str) {
        Some("array") => {
            result
                .entry("items".to_owned())
                .or_insert_with(|| json!({"type": "string"}));
        }
        Some("object") => {
            if let Some(Value::Object(properties)) = result.get_mut("properties") {
                let normalized: Map<String, Value> = properties
                    .iter()
                    .map(|(name, property)| (name.clone(), normalize_schema(property)))
                    .collect();
                *properties = normalized;
            }
        }
        _ => {}
    }

    Value::Object(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wraps_descriptor_into_function_shape() {
        let tool = json!({
            "name": "search",
            "description": "Find things",
            "inputSchema": {"type": "object", "properties": {"q": {"type": "string"}}},
        });
        let function = tool_to_function(tool.as_object().unwrap());
        assert_eq!(function["type"], "function");
        assert_eq!(function["function"]["name"], "search");
        assert_eq!(function["function"]["description"], "Find things");
        assert_eq!(
            function["function"]["parameters"]["properties"]["q"]["type"],
            "string"
        );
    }

    #[test]
    fn normalization_drops_excluded_members() {
        let schema = json!({
            "type": "object",
            "annotations": {"audience": ["assistant"]},
            "outputSchema": {"type": "string"},
            "properties": {},
        });
        let normalized = normalize_schema(&schema);
        assert!(normalized.get("annotations").is_none());
        assert!(normalized.get("outputSchema").is_none());
        assert_eq!(normalized["type"], "object");
    }

    #[test]
    fn arrays_without_items_get_a_string_default() {
        let schema = json!({"type": "array"});
        let normalized = normalize_schema(&schema);
        assert_eq!(normalized["items"], json!({"type": "string"}));

        let schema = json!({"type": "array", "items": {"type": "number"}});
        let normalized = normalize_schema(&schema);
        assert_eq!(normalized["items"], json!({"type": "number"}));
    }

    #[test]
    fn nested_properties_are_normalized_recursively() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": {"type": "array", "annotations": {}},
                "inner": {
                    "type": "object",
                    "properties": {"list": {"type": "array"}},
                },
            },
        });
        let normalized = normalize_schema(&schema);
        assert_eq!(
            normalized["properties"]["tags"],
            json!({"type": "array", "items": {"type": "string"}})
        );
        assert_eq!(
            normalized["properties"]["inner"]["properties"]["list"]["items"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn non_object_schemas_pass_through() {
        assert_eq!(normalize_schema(&json!(true)), json!(true));
    }
}
