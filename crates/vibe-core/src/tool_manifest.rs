use serde::Serialize;
use serde_json::Value;

/// Number of advertised tools; the manifest is a compatibility contract and
/// is not derived from any other source.
pub const BRIDGE_TOOL_COUNT: usize = 6;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// One typed parameter of an advertised tool.
pub struct ToolParameter {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// A static capability advertised to RPC clients via `tools/list`.
pub struct ToolDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ToolParameter>,
}

const fn required_param(
    name: &'static str,
    description: &'static str,
) -> ToolParameter {
    ToolParameter {
        name,
        kind: "string",
        description,
        required: true,
    }
}

const fn optional_param(
    name: &'static str,
    description: &'static str,
) -> ToolParameter {
    ToolParameter {
        name,
        kind: "string",
        description,
        required: false,
    }
}

/// Returns the fixed bridge tool manifest advertised by `tools/list`.
pub fn bridge_tool_manifest() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            id: "create-project",
            name: "Create Project",
            description: "Create a new project workspace on the backend",
            parameters: vec![
                required_param("name", "Name of the project to create"),
                optional_param("description", "Short description of the project"),
            ],
        },
        ToolDescriptor {
            id: "list-projects",
            name: "List Projects",
            description: "List every project known to the backend",
            parameters: Vec::new(),
        },
        ToolDescriptor {
            id: "switch-project",
            name: "Switch Project",
            description: "Switch the active project",
            parameters: vec![required_param("name", "Name of the project to activate")],
        },
        ToolDescriptor {
            id: "edit",
            name: "Edit File",
            description: "Replace a line range in a file of the active project",
            parameters: vec![
                required_param("file", "Path of the file to edit, relative to the project"),
                required_param("range", "Line range to replace, e.g. 3-7"),
            ],
        },
        ToolDescriptor {
            id: "exec",
            name: "Execute Command",
            description: "Execute a bridge command on the backend",
            parameters: vec![required_param("command", "Command text to execute")],
        },
        ToolDescriptor {
            id: "git-commit",
            name: "Git Commit",
            description: "Commit staged changes in the active project",
            parameters: vec![required_param("message", "Commit message")],
        },
    ]
}

/// The manifest as the JSON array returned inside the `tools/list` result.
pub fn tool_manifest_json() -> Value {
    serde_json::to_value(bridge_tool_manifest()).unwrap_or_else(|_| Value::Array(Vec::new()))
}
