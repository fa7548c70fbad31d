//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use civhub_core::Hub;
use tempfile::TempDir;

/// A hub with the catalog domains loaded.
pub fn initialized_hub() -> Hub {
    let mut hub = Hub::new();
    hub.initialize().expect("catalog domains initialize");
    hub
}

/// Isolated home for running the binary: logs, config and database all
/// land inside the temp dir.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn db_path(&self) -> PathBuf {
        self.path().join("store").join("civhub.db")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    /// Runs `civhub` with `args`, pointing `--db` at the sandbox database.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_civhub"))
            .args(args)
            .arg("--db")
            .arg(self.db_path())
            .current_dir(self.path())
            .env("HOME", self.path())
            .env("CIVHUB_CONFIG", self.config_path())
            .env_remove("RUST_LOG")
            .output()
            .expect("spawn civhub")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Float comparison for percentages and energies.
pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
