//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a sentra command with an isolated environment.
    ///
    /// - `SENTRA_HOME` set to the temporary state directory
    /// - `SENTRA_SCAN_ROOT` set to the temporary scan root
    /// - current directory set to the scan root
    /// - inherited session and server settings removed
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("sentra").expect("failed to find sentra binary");
        cmd.env("SENTRA_HOME", self.home.path());
        cmd.env("SENTRA_SCAN_ROOT", self.root.path());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("SENTRA_SESSION_TOKEN");
        cmd.env_remove("SENTRA_SERVER_URL");
        cmd.env_remove("SENTRA_LOG");
        cmd.current_dir(self.root.path());
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .unwrap_or_else(|e| panic!("failed to run sentra {:?}: {}", args, e))
    }

    pub fn scan(&self) -> Output {
        self.run(&["scan"])
    }

    pub fn add_all(&self) -> Output {
        self.run(&["add", "--all"])
    }

    pub fn commit(&self, message: &str) -> Output {
        self.run(&["commit", "-m", message])
    }

    pub fn status(&self) -> Output {
        self.run(&["status"])
    }

    pub fn log(&self) -> Output {
        self.run(&["log"])
    }
}
