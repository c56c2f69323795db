//! Declared content-management tools advertised to the model.

use once_cell::sync::Lazy;
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTool {
    SystemPrompt,
    UsersMe,
    ReadUsers,
    ReadCollections,
    ReadItems,
    CreateItem,
    UpdateItem,
    ReadFlows,
    TriggerFlow,
    ReadFolders,
    ReadFiles,
    ImportFile,
    UpdateFiles,
    ReadFields,
    ReadField,
    CreateField,
    UpdateField,
    ReadComments,
    UpsertComment,
    MarkdownTool,
}

impl KnownTool {
    pub const ALL: [KnownTool; 20] = [
        KnownTool::SystemPrompt,
        KnownTool::UsersMe,
        KnownTool::ReadUsers,
        KnownTool::ReadCollections,
        KnownTool::ReadItems,
        KnownTool::CreateItem,
        KnownTool::UpdateItem,
        KnownTool::ReadFlows,
        KnownTool::TriggerFlow,
        KnownTool::ReadFolders,
        KnownTool::ReadFiles,
        KnownTool::ImportFile,
        KnownTool::UpdateFiles,
        KnownTool::ReadFields,
        KnownTool::ReadField,
        KnownTool::CreateField,
        KnownTool::UpdateField,
        KnownTool::ReadComments,
        KnownTool::UpsertComment,
        KnownTool::MarkdownTool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KnownTool::SystemPrompt => "system-prompt",
            KnownTool::UsersMe => "users-me",
            KnownTool::ReadUsers => "read-users",
            KnownTool::ReadCollections => "read-collections",
            KnownTool::ReadItems => "read-items",
            KnownTool::CreateItem => "create-item",
            KnownTool::UpdateItem => "update-item",
            KnownTool::ReadFlows => "read-flows",
            KnownTool::TriggerFlow => "trigger-flow",
            KnownTool::ReadFolders => "read-folders",
            KnownTool::ReadFiles => "read-files",
            KnownTool::ImportFile => "import-file",
            KnownTool::UpdateFiles => "update-files",
            KnownTool::ReadFields => "read-fields",
            KnownTool::ReadField => "read-field",
            KnownTool::CreateField => "create-field",
            KnownTool::UpdateField => "update-field",
            KnownTool::ReadComments => "read-comments",
            KnownTool::UpsertComment => "upsert-comment",
            KnownTool::MarkdownTool => "markdown-tool",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            KnownTool::SystemPrompt => {
                "Get system information and role. This should be the first call."
            }
            KnownTool::UsersMe => "Get current user information.",
            KnownTool::ReadUsers => "List users. Use for searching by name.",
            KnownTool::ReadCollections => {
                "Dynamically get all available collections and their structures."
            }
            KnownTool::ReadItems => {
                "Get data from any collection. Dynamically determine collection name."
            }
            KnownTool::CreateItem => "Add dynamic data to any collection.",
            KnownTool::UpdateItem => "Update existing record.",
            KnownTool::ReadFlows => "List automated workflows.",
            KnownTool::TriggerFlow => "Trigger workflow.",
            KnownTool::ReadFolders => "List file folders.",
            KnownTool::ReadFiles => "List files or get single file information.",
            KnownTool::ImportFile => "Upload file from URL.",
            KnownTool::UpdateFiles => "Update file information.",
            KnownTool::ReadFields => "Get field definitions.",
            KnownTool::ReadField => "Get specific field definition.",
            KnownTool::CreateField => "Create new field.",
            KnownTool::UpdateField => "Update field definition.",
            KnownTool::ReadComments => "Get record comments.",
            KnownTool::UpsertComment => "Add or update comment.",
            KnownTool::MarkdownTool => "HTML-Markdown conversion.",
        }
    }

    /// JSON schema of the tool's argument object.
    pub fn parameters(self) -> Value {
        let string_list = json!({"type": "array", "items": {"type": "string"}});
        let open_object = json!({"type": "object", "additionalProperties": true});
        let collection = json!({"type": "string", "description": "Collection name"});

        match self {
            KnownTool::SystemPrompt | KnownTool::UsersMe | KnownTool::ReadCollections => json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            KnownTool::ReadUsers => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "object",
                        "properties": {
                            "filter": {"type": "object", "description": "User filtering"},
                            "fields": string_list,
                            "limit": {"type": "number"},
                            "search": {"type": "string", "description": "Name search"}
                        }
                    }
                }
            }),
            KnownTool::ReadItems => json!({
                "type": "object",
                "properties": {
                    "collection": {"type": "string", "description": "Dynamic collection name"},
                    "query": {
                        "type": "object",
                        "properties": {
                            "filter": {"type": "object"},
                            "limit": {"type": "number"},
                            "offset": {"type": "number"},
                            "fields": string_list,
                            "sort": string_list,
                            "search": {"type": "string"}
                        }
                    }
                },
                "required": ["collection"]
            }),
            KnownTool::CreateItem => json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "item": {
                        "type": "object",
                        "description": "Record data to create",
                        "additionalProperties": true
                    }
                },
                "required": ["collection", "item"]
            }),
            KnownTool::UpdateItem => json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "id": {"type": "string", "description": "Record ID"},
                    "data": {
                        "type": "object",
                        "description": "Data to update",
                        "additionalProperties": true
                    }
                },
                "required": ["collection", "id", "data"]
            }),
            KnownTool::ReadFlows | KnownTool::ReadFolders => json!({
                "type": "object",
                "properties": {"query": {"type": "object"}}
            }),
            KnownTool::TriggerFlow => json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "description": "Flow ID"},
                    "data": open_object,
                    "keys": string_list
                },
                "required": ["id"]
            }),
            KnownTool::ReadFiles => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "object"},
                    "id": {"type": "string", "description": "File ID"},
                    "raw": {"type": "boolean", "description": "Get raw content"}
                }
            }),
            KnownTool::ImportFile => json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "File URL"},
                    "data": open_object
                },
                "required": ["url"]
            }),
            KnownTool::UpdateFiles => json!({
                "type": "object",
                "properties": {
                    "ids": string_list,
                    "data": open_object
                },
                "required": ["ids", "data"]
            }),
            KnownTool::ReadFields => json!({
                "type": "object",
                "properties": {
                    "collection": {"type": "string", "description": "Collection name (optional)"}
                }
            }),
            KnownTool::ReadField => json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "field": {"type": "string", "description": "Field name"}
                },
                "required": ["collection", "field"]
            }),
            KnownTool::CreateField => json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "field": open_object
                },
                "required": ["collection", "field"]
            }),
            KnownTool::UpdateField => json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "field": {"type": "string", "description": "Field name"},
                    "data": open_object
                },
                "required": ["collection", "field", "data"]
            }),
            KnownTool::ReadComments => json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "item": {"type": "string", "description": "Record ID"}
                },
                "required": ["collection", "item"]
            }),
            KnownTool::UpsertComment => json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "item": {"type": "string", "description": "Record ID"},
                    "comment": {"type": "string", "description": "Comment text"},
                    "id": {"type": "string", "description": "Comment ID (for update)"}
                },
                "required": ["collection", "item", "comment"]
            }),
            KnownTool::MarkdownTool => json!({
                "type": "object",
                "properties": {
                    "content": {"type": "string", "description": "Content to convert"},
                    "to": {
                        "type": "string",
                        "enum": ["html", "markdown"],
                        "description": "Target format"
                    }
                },
                "required": ["content", "to"]
            }),
        }
    }

    /// OpenAI `tools[]` entry.
    pub fn schema(self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.as_str(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }
}

static CATALOG: Lazy<Vec<Value>> =
    Lazy::new(|| KnownTool::ALL.iter().map(|tool| tool.schema()).collect());

/// Every declared tool schema, in declaration order.
pub fn tool_catalog() -> &'static [Value] {
    &CATALOG
}
