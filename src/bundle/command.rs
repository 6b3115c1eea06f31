//! External script bundler.
//!
//! The bundler is a separate program (esbuild, rollup, ...) configured in
//! `[script_bundler]`. It runs from the project root with `{entry}` in its
//! arguments replaced by the entry path, and must print the bundle to stdout.
//! A non-zero exit status fails the build with the program's stderr as the
//! diagnostic.

use super::backend::{BundleError, Bundler};
use crate::config::{ENTRY_PLACEHOLDER, ScriptBundlerConfig};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub struct CommandBundler {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandBundler {
    pub fn new(config: &ScriptBundlerConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: working_dir.into(),
        }
    }

    /// Arguments with the entry placeholder expanded.
    pub fn command_args(&self, entry: &Path) -> Vec<String> {
        let entry = entry.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(ENTRY_PLACEHOLDER, &entry))
            .collect()
    }
}

impl Bundler for CommandBundler {
    fn name(&self) -> &str {
        &self.program
    }

    fn bundle(&self, entry: &Path) -> Result<String, BundleError> {
        let output = Command::new(&self.program)
            .args(self.command_args(entry))
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| BundleError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("exited with {}", output.status),
                diagnostic => diagnostic.to_string(),
            };
            return Err(BundleError::Engine {
                engine: self.program.clone(),
                message,
            });
        }

        let code = String::from_utf8(output.stdout).map_err(|_| BundleError::Engine {
            engine: self.program.clone(),
            message: "bundle is not valid UTF-8".to_string(),
        })?;
        if code.trim().is_empty() {
            return Err(BundleError::EmptyOutput {
                engine: self.program.clone(),
            });
        }
        Ok(code)
    }
}
