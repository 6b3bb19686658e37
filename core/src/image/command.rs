// Child process execution for collaborator tools

use crate::error::{ImageError, Result};
use std::process::{Command, Output};

/// Run `cmd` to completion, failing unless it exits successfully
///
/// Both output streams are captured and attached to the error.
pub(crate) fn run(cmd: &mut Command) -> Result<Output> {
    let tool = cmd.get_program().to_string_lossy().into_owned();
    tracing::debug!(command = ?cmd, "spawning");

    let output = cmd
        .output()
        .map_err(ImageError::io(format!("spawning `{tool}`")))?;

    if !output.status.success() {
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(ImageError::Collaborator {
            tool,
            status: output.status,
            output: text,
        });
    }
    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_output() {
        let err = run(Command::new("sh").args(["-c", "echo broken >&2; exit 3"])).unwrap_err();
        match err {
            ImageError::Collaborator {
                tool,
                status,
                output,
            } => {
                assert_eq!(tool, "sh");
                assert_eq!(status.code(), Some(3));
                assert_eq!(output.trim(), "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_is_io() {
        let err = run(&mut Command::new("/nonexistent/hyper-tool")).unwrap_err();
        assert!(matches!(err, ImageError::Io { .. }));
    }
}
