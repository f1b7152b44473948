//! Thin boundary around the `osascript` automation channel.
//!
//! Every query upstream components issue goes through [`ScriptBridge`], so
//! tests can substitute a canned implementation and the rest of the workspace
//! never touches a subprocess directly. The bridge is a shared
//! single-concurrency resource: callers must not overlap invocations.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// The channel's command-failure signal.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to launch osascript: {0}")]
    Launch(#[from] std::io::Error),
    #[error("script failed: {0}")]
    Failed(String),
    #[error("script produced invalid UTF-8 output")]
    BadOutput,
}

#[async_trait]
pub trait ScriptBridge: Send + Sync {
    /// Runs an AppleScript source, passing `args` through to its `on run`
    /// handler, and returns raw stdout with the trailing newline removed.
    async fn run_script(&self, source: &str, args: &[String]) -> Result<String, ScriptError>;
}

/// Production bridge: one `osascript` subprocess per invocation.
///
/// Process activation dominates the cost of every call, which is why the
/// layers above batch their queries instead of looping over applications.
#[derive(Debug, Default)]
pub struct OsaBridge;

impl OsaBridge {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptBridge for OsaBridge {
    async fn run_script(&self, source: &str, args: &[String]) -> Result<String, ScriptError> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(source)
            .args(args)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(%stderr, "osascript returned failure");
            return Err(ScriptError::Failed(stderr));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| ScriptError::BadOutput)?;
        Ok(stdout.trim_end_matches('\n').to_string())
    }
}

/// Sends a single command to one application:
/// `tell application id "<app_id>" to <command>`.
pub async fn invoke(
    bridge: &dyn ScriptBridge,
    app_id: &str,
    command: &str,
) -> Result<String, ScriptError> {
    let source = format!("tell application id \"{app_id}\" to {command}");
    bridge.run_script(&source, &[]).await
}

/// Splits the output of a batched script into items.
///
/// Batched scripts coerce their result list to text with linefeed delimiters,
/// one item per line, so titles containing commas survive the round trip. An
/// empty output is an empty batch, not one empty item.
pub fn split_lines(output: &str) -> Vec<String> {
    if output.is_empty() {
        return Vec::new();
    }
    output.split('\n').map(|s| s.to_string()).collect()
}
