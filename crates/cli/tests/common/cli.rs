//! Helpers for running the `paperproxy` binary
//!
//! Only used for runs that are expected to terminate on their own (fatal
//! startup conditions); a healthy service never exits by itself.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

/// Environment variables the service reads; cleared so the host can't leak in
const SERVICE_ENV: &[&str] = &[
    "WATCH_DIR",
    "PAPERLESS_HOST",
    "PAPERLESS_API_KEY",
    "PAPERLESS_TAG",
    "EVICT_AFTER_SECS",
    "LOG_LEVEL",
];

/// Command builder for the service binary
pub struct ProxyCommand {
    binary_path: PathBuf,
    env: HashMap<String, String>,
}

impl ProxyCommand {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_paperproxy")),
            env: HashMap::new(),
        }
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Execute and collect the output
    pub fn execute(&self) -> Result<CommandResult> {
        let mut command = Command::new(&self.binary_path);
        for key in SERVICE_ENV {
            command.env_remove(key);
        }
        command.envs(&self.env);

        let output = command.output().context("Failed to execute paperproxy")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nEnv: {:?}\nStdout: {}",
                self.env,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}
