//! Shared test utilities for the sitepack test suite.
//!
//! The sample project under `fixtures/project/` is a complete, buildable
//! project: descriptor, template, script and stylesheet entries (with an
//! `@import`), service-worker template, and icon.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = setup_project();
//! let layout = ProjectLayout::new(project.path(), &PathsConfig::default());
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::manifest::{Brand, ProjectManifest};

/// The fixture HTML template.
pub const TEMPLATE: &str = include_str!("../fixtures/project/index.html");

/// The fixture service-worker template.
pub const SERVICE_WORKER_TEMPLATE: &str =
    include_str!("../fixtures/project/src/service-worker.template.js");

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/project/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/project");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Values matching the fixture descriptor
// =========================================================================

pub fn test_brand() -> Brand {
    Brand {
        name: "Shopping List".to_string(),
        short_name: "Shopping".to_string(),
        description: "Lists & <b>more</b>".to_string(),
    }
}

pub fn test_manifest() -> ProjectManifest {
    ProjectManifest {
        name: Some("shopping-list".to_string()),
        version: "1.4.0".to_string(),
        brand: test_brand(),
        artifact_name: "shopping-list".to_string(),
    }
}

#[test]
fn fixture_descriptor_matches_test_manifest() {
    let project = setup_project();
    let loaded = crate::manifest::load_manifest(&project.path().join("package.json")).unwrap();
    assert_eq!(loaded, test_manifest());
}
