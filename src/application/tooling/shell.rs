//! Bounded shell execution

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// Run one shell command in the current working directory.
///
/// The invocation is bounded by `limit`; an overrun is reported in the
/// returned string, never raised. Output combines stdout with a labelled
/// stderr block the way the agent protocol expects to echo it back.
pub async fn execute_command(command: &str, limit: Duration) -> String {
    info!(command, "Executing shell command");

    let mut invocation = shell_invocation(command);
    let result = tokio::time::timeout(limit, invocation.output()).await;

    match result {
        Ok(Ok(output)) => render_output(output),
        Ok(Err(err)) => format!("Error executing command: {err}"),
        Err(_) => {
            warn!(command, timeout_secs = limit.as_secs(), "Command timed out");
            format!(
                "Error executing command: timed out after {} seconds",
                limit.as_secs()
            )
        }
    }
}

#[cfg(windows)]
fn shell_invocation(command: &str) -> Command {
    let mut invocation = Command::new("cmd");
    invocation.arg("/C").arg(command).kill_on_drop(true);
    invocation
}

#[cfg(not(windows))]
fn shell_invocation(command: &str) -> Command {
    let mut invocation = Command::new("sh");
    invocation.arg("-c").arg(command).kill_on_drop(true);
    invocation
}

fn render_output(output: Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut rendered = String::new();
    if !stdout.is_empty() {
        rendered.push_str(&stdout);
    }
    if !stderr.is_empty() {
        rendered.push_str(&format!("\nSTDERR: {stderr}"));
    }

    if rendered.is_empty() {
        "Command executed successfully (no output)".to_string()
    } else {
        rendered
    }
}
