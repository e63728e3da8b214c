//! Bounded execution of OS helper commands.

use posture_core::SourceError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Captured output of a helper command.
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout and stderr together, for matching error messages
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

pub fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Run `program` with `args`, killing it if it outlives `timeout`.
///
/// A non-zero exit is returned as output, not as an error: callers decide
/// what the tool's failure text means.
pub async fn run(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, SourceError> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

    debug!(program, ?args, "running helper command");

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(SourceError::Unavailable(format!("{program}: {e}"))),
        Err(_) => return Err(SourceError::Timeout(millis(timeout))),
    };

    Ok(CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let err = run(
            "posturescan-no-such-helper",
            &[],
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(err.is_unavailable());
    }
}
