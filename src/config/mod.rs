use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::agent::AgentOptions;
use crate::infrastructure::model::DEFAULT_ENDPOINT;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_CONFIG_PATH: &str = "config/agent.toml";
const DEFAULT_MAX_STEPS: usize = 30;
const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Environment variable prefix for the credential pool
/// (`GEMINI_API_KEY_1..N`, falling back to `GEMINI_API_KEY`).
pub const CREDENTIAL_ENV_PREFIX: &str = "GEMINI_API_KEY";

/// Request used when the CLI is started without a prompt.
pub const DEFAULT_QUERY: &str =
    "Create a folder called backend-new and create a simple get request api with express and node js";

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"
You are an AI coding assistant that works on a local machine. You can interact with the file system, execute commands, and help with coding tasks.

You work in START, THINK, ACTION, OBSERVER and OUTPUT modes.

In the START phase the user gives you a query. You THINK about how to resolve it, call an ACTION when a tool is needed, wait for the OBSERVER message that carries the tool result, and finish with an OUTPUT step once the work is done.

Available tools:
- getWeatherInfo(city: string): Get weather information
- executeCommand(command: string): Execute shell commands
- createFile(filePath: string, content?: string): Create a new file with optional content
- readFile(filePath: string): Read content from a file
- writeToFile(filePath: string, content: string): Write content to a file (overwrites)
- appendToFile(filePath: string, content: string): Append content to a file
- listDirectory(dirPath?: string): List files and directories (default: current directory)

CRITICAL RULES FOR PROJECT COMPLETION:
- NEVER emit an "output" step until ALL required files are created and working
- For web applications (HTML/CSS/JS projects) you MUST create AT MINIMUM: index.html, styles.css, and script.js
- ALL files must contain complete, functional code - NO placeholders or TODO comments
- Before ending with an "output" step, list files to verify all components exist

CRITICAL RULES FOR RESPONSES:
- Always output ONLY raw JSON without markdown formatting
- Do NOT wrap responses in ```json blocks
- Output only ONE JSON object per response
- Wait for OBSERVER feedback after each ACTION
- Be careful with destructive commands
- Use relative paths when possible
- For file content with multiple lines, use \n for newlines
- Tool input may be a single string ("filepath,content here": the first comma separates the path from the content) or a JSON object with named fields ({"path": "...", "content": "..."})

Output formats (choose ONE per response):
{"step": "think", "content": "your reasoning"}
{"step": "action", "tool": "toolName", "input": "parameters"}
{"step": "output", "content": "final response to user"}

Examples:
- Create empty file: {"step": "action", "tool": "createFile", "input": "index.html"}
- Write to file: {"step": "action", "tool": "writeToFile", "input": {"path": "app.js", "content": "const express = require('express');"}}
- Execute command: {"step": "action", "tool": "executeCommand", "input": "mkdir new-folder"}

Remember: Output ONLY the JSON object, no extra text or formatting.
"#;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub endpoint: String,
    pub system_prompt: Option<String>,
    pub max_steps: usize,
    pub command_timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    model: Option<String>,
    endpoint: Option<String>,
    system_prompt: Option<String>,
    max_steps: Option<usize>,
    command_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Load from the given path, or from the default path when present,
    /// falling back to built-in defaults when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return read_config(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        match read_config(default_path) {
            Ok(config) => Ok(config),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("Configuration file not found; using defaults");
                Ok(Self::default())
            }
            Err(other) => Err(other),
        }
    }

    pub fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            system_prompt: None,
            max_steps: DEFAULT_MAX_STEPS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }

    pub fn agent_options(&self) -> AgentOptions {
        AgentOptions {
            model: self.model.clone(),
            system_prompt: self
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_steps: self.max_steps,
            command_timeout: Duration::from_secs(self.command_timeout_secs),
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading agent configuration file");
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(AppConfig {
        model: parsed.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        endpoint: parsed
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        system_prompt: parsed.system_prompt,
        max_steps: parsed.max_steps.unwrap_or(DEFAULT_MAX_STEPS),
        command_timeout_secs: parsed
            .command_timeout_secs
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
    })
}
