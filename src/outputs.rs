//! Step outputs for GitHub Actions.
//!
//! When `GITHUB_OUTPUT` names a file, outputs are appended to it as
//! `name=value` lines; otherwise they are only logged.

use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct ActionOutputs {
    file: Option<PathBuf>,
}

impl ActionOutputs {
    pub fn from_env() -> Self {
        Self::new(
            std::env::var_os("GITHUB_OUTPUT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        )
    }

    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    /// Records one output. Values are single-line (GUIDs and counts).
    pub fn set(&self, name: &str, value: &str) -> std::io::Result<()> {
        tracing::info!(output = %name, value = %value, "Set output");

        let Some(path) = &self.file else {
            return Ok(());
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}={}", name, value.replace(['\r', '\n'], " "))
    }
}
