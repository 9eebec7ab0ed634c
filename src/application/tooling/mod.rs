//! Local tool surface.
//!
//! The tool set is a closed enum rather than a string-indexed table: dispatch
//! is one match with a compile-time-checked default case, and unknown names
//! surface as `None` for the runner to report back to the model.

pub mod files;
pub mod shell;

use serde_json::Value;
use std::time::Duration;

/// One decoded tool invocation, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    Weather { city: String },
    RunCommand { command: String },
    CreateFile { path: String, content: Option<String> },
    ReadFile { path: String },
    WriteFile { path: String, content: Option<String> },
    AppendFile { path: String, content: Option<String> },
    ListDirectory { path: String },
}

impl ToolCommand {
    /// Decode an action input for the named tool.
    ///
    /// Two input shapes are accepted: a JSON object with named fields
    /// (`city`, `command`, `path`, `content`), or the wire protocol's raw
    /// string where the first comma separates a path from trailing content
    /// for the write-family tools and `executeCommand` is never split.
    /// Returns `None` for names outside the published tool set.
    pub fn decode(name: &str, input: &Value) -> Option<Self> {
        let command = match name {
            "getWeatherInfo" => Self::Weather {
                city: single_argument(input, "city"),
            },
            "executeCommand" => Self::RunCommand {
                command: match input {
                    Value::Object(map) => string_field(map, "command").unwrap_or_default(),
                    other => raw_text(other).trim().to_string(),
                },
            },
            "createFile" => {
                let (path, content) = path_and_content(input);
                Self::CreateFile { path, content }
            }
            "readFile" => Self::ReadFile {
                path: single_argument(input, "path"),
            },
            "writeToFile" => {
                let (path, content) = path_and_content(input);
                Self::WriteFile { path, content }
            }
            "appendToFile" => {
                let (path, content) = path_and_content(input);
                Self::AppendFile { path, content }
            }
            "listDirectory" => {
                let path = single_argument(input, "path");
                Self::ListDirectory {
                    path: if path.is_empty() {
                        ".".to_string()
                    } else {
                        path
                    },
                }
            }
            _ => return None,
        };
        Some(command)
    }

    /// Published name, as listed in the system prompt.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Weather { .. } => "getWeatherInfo",
            Self::RunCommand { .. } => "executeCommand",
            Self::CreateFile { .. } => "createFile",
            Self::ReadFile { .. } => "readFile",
            Self::WriteFile { .. } => "writeToFile",
            Self::AppendFile { .. } => "appendToFile",
            Self::ListDirectory { .. } => "listDirectory",
        }
    }

    /// Execute the tool. Faults never escape: every outcome, including
    /// timeouts and I/O errors, is folded into the returned string.
    pub async fn run(self, command_timeout: Duration) -> String {
        match self {
            Self::Weather { city } => {
                format!("The weather in {city} is 45 degrees celsius.")
            }
            Self::RunCommand { command } => shell::execute_command(&command, command_timeout).await,
            Self::CreateFile { path, content } => files::create_file(&path, content.as_deref()),
            Self::ReadFile { path } => files::read_file(&path),
            Self::WriteFile { path, content } => files::write_file(&path, content.as_deref()),
            Self::AppendFile { path, content } => files::append_file(&path, content.as_deref()),
            Self::ListDirectory { path } => files::list_directory(&path),
        }
    }
}

fn raw_text(input: &Value) -> String {
    match input {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_field(map: &serde_json::Map<String, Value>, field: &str) -> Option<String> {
    match map.get(field) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

/// First positional argument: named field for objects, first comma-separated
/// token for raw strings.
fn single_argument(input: &Value, field: &str) -> String {
    match input {
        Value::Object(map) => string_field(map, field).unwrap_or_default(),
        other => raw_text(other)
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

/// Write-family convention: the first comma splits the path from the content,
/// and everything after it (commas included) belongs to the content verbatim.
fn path_and_content(input: &Value) -> (String, Option<String>) {
    match input {
        Value::Object(map) => (
            string_field(map, "path").unwrap_or_default(),
            string_field(map, "content"),
        ),
        other => {
            let text = raw_text(other);
            match text.find(',') {
                Some(index) if index > 0 => (
                    text[..index].trim().to_string(),
                    Some(text[index + 1..].to_string()),
                ),
                _ => (text.trim().to_string(), None),
            }
        }
    }
}
