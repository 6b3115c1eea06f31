//! Build configuration.
//!
//! Two layers feed a build:
//!
//! - [`BuildConfiguration`]: the `debug` / `offline` switches. Fixed before the
//!   build starts and handed to every stage by shared reference.
//! - [`PipelineConfig`]: an optional `sitepack.toml` in the project root that
//!   overrides the stock defaults (the switches above, the conventional input
//!   paths, and the external script bundler command).
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [build]
//! debug = false             # Enable the phone-debug script blocks
//! offline = true            # Emit appcache, service worker, web manifest, icon
//!
//! [paths]
//! manifest = "package.json"
//! template = "index.html"
//! script_entry = "src/main.js"
//! style_entry = "src/css/main.css"
//! service_worker = "src/service-worker.template.js"
//! icon = "icon.png"
//! target = "target"         # Deleted and recreated on every build
//!
//! [script_bundler]
//! program = "esbuild"
//! args = ["{entry}", "--bundle", "--format=iife", "--global-name=main"]
//! ```
//!
//! Config files are sparse: override only what differs. Unknown keys are
//! rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// File name of the optional pipeline config in the project root.
pub const CONFIG_FILENAME: &str = "sitepack.toml";

/// Placeholder in `script_bundler.args` replaced by the entry path.
pub const ENTRY_PLACEHOLDER: &str = "{entry}";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build-time switches. Read-only once the build begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfiguration {
    /// Keep and enable the debug script blocks.
    pub debug: bool,
    /// Run offline packaging and wire it into the HTML.
    pub offline: bool,
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            debug: false,
            offline: true,
        }
    }
}

/// A switch a conditional template block can be governed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Debug,
    Offline,
}

impl BuildConfiguration {
    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::Debug => self.debug,
            Flag::Offline => self.offline,
        }
    }
}

/// Conventional input and output locations, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub manifest: PathBuf,
    pub template: PathBuf,
    pub script_entry: PathBuf,
    pub style_entry: PathBuf,
    pub service_worker: PathBuf,
    pub icon: PathBuf,
    pub target: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            manifest: "package.json".into(),
            template: "index.html".into(),
            script_entry: "src/main.js".into(),
            style_entry: "src/css/main.css".into(),
            service_worker: "src/service-worker.template.js".into(),
            icon: "icon.png".into(),
            target: "target".into(),
        }
    }
}

/// External script bundler invocation.
///
/// The program is run from the project root and must write the bundled
/// script to stdout. Diagnostics on stderr are surfaced on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptBundlerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ScriptBundlerConfig {
    fn default() -> Self {
        Self {
            program: "esbuild".to_string(),
            args: vec![
                ENTRY_PLACEHOLDER.to_string(),
                "--bundle".to_string(),
                "--format=iife".to_string(),
                "--global-name=main".to_string(),
            ],
        }
    }
}

/// Everything `sitepack.toml` can set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub build: BuildConfiguration,
    pub paths: PathsConfig,
    pub script_bundler: ScriptBundlerConfig,
}

impl PipelineConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("paths.manifest", &self.paths.manifest),
            ("paths.template", &self.paths.template),
            ("paths.script_entry", &self.paths.script_entry),
            ("paths.style_entry", &self.paths.style_entry),
            ("paths.service_worker", &self.paths.service_worker),
            ("paths.icon", &self.paths.icon),
            ("paths.target", &self.paths.target),
        ];
        for (key, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        // The target is deleted on every build; it must stay inside the project.
        if !self
            .paths
            .target
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(ConfigError::Validation(
                "paths.target must be a relative path below the project root".into(),
            ));
        }
        let target = &self.paths.target;
        for (key, path) in &paths[..paths.len() - 1] {
            if without_cur_dir(path).starts_with(target) {
                return Err(ConfigError::Validation(format!(
                    "paths.target must not contain {key} ({}); it is deleted on every build",
                    path.display()
                )));
            }
        }
        if self.script_bundler.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "script_bundler.program must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// `path` with any `.` components dropped, for component-wise comparison.
fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Load `sitepack.toml` from the project root.
///
/// Returns stock defaults when the file does not exist.
pub fn load_config(project_root: &Path) -> Result<PipelineConfig, ConfigError> {
    let config_path = project_root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(PipelineConfig::default());
    }
    let content = fs::read_to_string(&config_path)?;
    let config: PipelineConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// A documented stock `sitepack.toml` with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r#"# sitepack configuration
# ======================
#
# Place this file next to package.json. Every option is optional; remove the
# ones you do not need to change.

# ---------------------------------------------------------------------------
# Build switches
# ---------------------------------------------------------------------------
[build]
# Keep the phone-debug script blocks and make them executable.
debug = false
# Emit manifest.appcache, sw.js, manifest.json and icon-192.png, and wire
# them into index.html.
offline = true

# ---------------------------------------------------------------------------
# Input and output locations, relative to the project root
# ---------------------------------------------------------------------------
[paths]
manifest = "package.json"
template = "index.html"
script_entry = "src/main.js"
style_entry = "src/css/main.css"
service_worker = "src/service-worker.template.js"
icon = "icon.png"
# Deleted and recreated on every build.
target = "target"

# ---------------------------------------------------------------------------
# External script bundler
# ---------------------------------------------------------------------------
# Run from the project root; must print the bundle to stdout.
# "{entry}" is replaced by the path of paths.script_entry.
[script_bundler]
program = "esbuild"
args = ["{entry}", "--bundle", "--format=iife", "--global-name=main"]
"#
}
