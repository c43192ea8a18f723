//! External Tool Invocation
//!
//! The assembler, linker and make are opaque programs. A run is
//! create-then-join: the caller blocks until the child exits. Output is
//! inherited, never inspected; only the exit status counts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to start {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `code` is `None` when the child was killed by a signal.
    #[error("{program} exited with status {}", describe_status(.code))]
    Exit { program: String, code: Option<i32> },
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// One program + argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn display_program(&self) -> String {
        self.program.display().to_string()
    }
}

/// Runs one invocation to completion.
pub trait ToolRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), ToolError>;
}

/// Spawns real child processes.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), ToolError> {
        let program = invocation.display_program();
        tracing::debug!(program = %program, args = ?invocation.args, "starting tool");

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|source| ToolError::Launch {
                program: program.clone(),
                source,
            })?;

        tracing::info!(program = %program, status = ?status.code(), "tool finished");
        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Exit {
                program,
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_launch_error() {
        let invocation = Invocation::new("/definitely/not/a/tool", vec![]);
        let err = SystemRunner.run(&invocation).unwrap_err();
        assert!(matches!(err, ToolError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status() {
        assert!(SystemRunner.run(&Invocation::new("true", vec![])).is_ok());

        let err = SystemRunner.run(&Invocation::new("false", vec![])).unwrap_err();
        match err {
            ToolError::Exit { program, code } => {
                assert_eq!(program, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exit_message() {
        let err = ToolError::Exit { program: "make".into(), code: Some(2) };
        assert_eq!(err.to_string(), "make exited with status 2");
    }
}
