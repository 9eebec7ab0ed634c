use crate::config;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_MAX_STEPS: usize = 30;
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// One executed tool interaction, kept for the final report.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub tool: String,
    pub input: Value,
    pub output: String,
}

/// How a run ended. All three are ordinary exits; fatal conditions travel
/// through `AgentError` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The model emitted an accepted output step.
    Completed,
    /// The step budget ran out before an output step arrived.
    BudgetExhausted,
    /// The model replied with prose containing no JSON at all.
    NonJsonReply,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub run_id: String,
    pub status: RunStatus,
    pub response: Option<String>,
    pub steps: Vec<AgentStep>,
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub model: String,
    pub system_prompt: String,
    pub max_steps: usize,
    pub command_timeout: Duration,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: config::DEFAULT_MODEL.to_string(),
            system_prompt: config::DEFAULT_SYSTEM_PROMPT.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}
