//! Common test utilities for schemaprobe integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated HOME with its own `.schemaprobe` directory
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let config_dir = temp_dir.path().join(".schemaprobe");

        Ok(Self {
            temp_dir,
            config_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// Command running inside the test environment with no ambient API key
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_schemaprobe"));
        cmd.current_dir(self.temp_dir.path());
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("DEEPSEEK_API_KEY");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn write_config(&self, content: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::write(self.config_file(), content)?;
        Ok(())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
