//! Project descriptor loading.
//!
//! The descriptor is the project's `package.json`. Only a handful of fields
//! matter to the build:
//!
//! ```json
//! {
//!   "name": "shopping-list",
//!   "version": "1.4.0",
//!   "brand": {
//!     "name": "Shopping List",
//!     "shortName": "Shopping",
//!     "description": "A list that works offline"
//!   },
//!   "build": { "artifactName": "shopping-list" }
//! }
//! ```
//!
//! Everything else in the file (dependencies, scripts, ...) is ignored. The
//! loaded [`ProjectManifest`] is immutable for the duration of a build.

use crate::artifacts::ArtifactNames;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("cannot read project descriptor {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed project descriptor {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid project descriptor: {0}")]
    Invalid(String),
}

/// Branding shared by the HTML template and the web-app manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub name: String,
    pub short_name: String,
    pub description: String,
}

/// The subset of the project descriptor the build reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectManifest {
    /// Package name; only used for the completion message.
    pub name: Option<String>,
    pub version: String,
    pub brand: Brand,
    /// Base file stem shared by the generated script and stylesheet.
    pub artifact_name: String,
}

impl ProjectManifest {
    /// Name shown in the completion message: the package name when present,
    /// the brand name otherwise.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.brand.name)
    }
}

#[derive(Deserialize)]
struct RawManifest {
    name: Option<String>,
    version: String,
    brand: Brand,
    build: RawBuildSection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBuildSection {
    artifact_name: String,
}

/// Parse a descriptor from JSON text.
///
/// `path` is only used for error messages.
pub fn parse_manifest(content: &str, path: &Path) -> Result<ProjectManifest, ManifestError> {
    let raw: RawManifest = serde_json::from_str(content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let manifest = ProjectManifest {
        name: raw.name,
        version: raw.version,
        brand: raw.brand,
        artifact_name: raw.build.artifact_name,
    };
    validate(&manifest)?;
    Ok(manifest)
}

/// Read and parse the descriptor at `path`.
pub fn load_manifest(path: &Path) -> Result<ProjectManifest, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&content, path)
}

fn validate(manifest: &ProjectManifest) -> Result<(), ManifestError> {
    if manifest.version.trim().is_empty() {
        return Err(ManifestError::Invalid("version must not be empty".into()));
    }
    let stem = manifest.artifact_name.as_str();
    if stem.is_empty() {
        return Err(ManifestError::Invalid(
            "build.artifactName must not be empty".into(),
        ));
    }
    // The stem becomes a file name inside the target directory.
    if stem.contains(['/', '\\']) || stem == "." || stem == ".." {
        return Err(ManifestError::Invalid(format!(
            "build.artifactName must be a bare file name, got {stem:?}"
        )));
    }
    if let Some(name) = ArtifactNames::new(stem).reserved_collision() {
        return Err(ManifestError::Invalid(format!(
            "build.artifactName {stem:?} would write {name}, which the build already writes"
        )));
    }
    Ok(())
}
