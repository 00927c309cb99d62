use rust_mcp_schema::ToolInputSchema;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

fn create_prop(type_str: &str, description: &str) -> Map<String, Value> {
    json!({
        "type": type_str,
        "description": description
    })
    .as_object()
    .unwrap()
    .clone()
}

fn create_array_prop(item_type_str: &str, description: &str) -> Map<String, Value> {
    json!({
        "type": "array",
        "items": { "type": item_type_str },
        "description": description
    })
    .as_object()
    .unwrap()
    .clone()
}

pub fn open_terminals_schema() -> ToolInputSchema {
    ToolInputSchema::new(vec![], None)
}

pub fn open_selected_terminals_schema() -> ToolInputSchema {
    let mut properties = HashMap::new();
    properties.insert(
        "names".to_string(),
        create_array_prop(
            "string",
            "Names of declared terminals to open, as picked by the user. \
             Reply order does not matter; sessions open in declaration order.",
        ),
    );
    ToolInputSchema::new(vec!["names".to_string()], Some(properties))
}

pub fn kill_terminals_schema() -> ToolInputSchema {
    ToolInputSchema::new(vec![], None)
}

pub fn init_settings_schema() -> ToolInputSchema {
    ToolInputSchema::new(vec![], None)
}

pub fn list_sessions_schema() -> ToolInputSchema {
    ToolInputSchema::new(vec![], None)
}

pub fn read_session_output_schema() -> ToolInputSchema {
    let mut properties = HashMap::new();
    properties.insert(
        "session_id".to_string(),
        create_prop("string", "Session ID from list_sessions or an open result."),
    );
    ToolInputSchema::new(vec!["session_id".to_string()], Some(properties))
}
