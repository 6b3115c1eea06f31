//! Offline packaging.
//!
//! Runs only for offline builds. Produces four artifacts next to the page:
//!
//! | File | Contents |
//! |------|----------|
//! | `manifest.appcache` | Legacy application cache manifest |
//! | `sw.js` | Service worker, rendered from the project's template |
//! | `manifest.json` | Web-app manifest for installability |
//! | `icon-192.png` | Byte-identical copy of the project icon |
//!
//! ## Appcache Format
//!
//! Consumed by legacy offline-cache clients; must match byte-for-byte:
//!
//! ```text
//! CACHE MANIFEST
//! # v1.4.0
//! NETWORK
//! "*"
//! CACHE
//! shopping-list.js
//! shopping-list.css
//! index.html
//! icon-192.png
//! ```
//!
//! ## Service Worker Template
//!
//! The template is plain JavaScript with three quoted tokens, each replaced
//! everywhere it occurs:
//!
//! - `"%%VERSION%%"` → the build version as a string literal
//! - `"%%FILES%%"` → the offline file list as a JSON array
//! - `"%%ARTIFACT_NAME%%"` → the artifact stem as a JSON string
//!
//! The version is baked into the cache name, so deploying a new version
//! invalidates old caches.

use crate::artifacts::{self, ArtifactNames, OfflineFileSet};
use crate::manifest::{Brand, ProjectManifest};
use crate::outdir::{self, FilesystemError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackagingError {
    #[error("cannot read service worker template {}: {source}", path.display())]
    ReadTemplate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read icon {}: {source}", path.display())]
    ReadIcon {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Output(#[from] FilesystemError),
    #[error("offline file {0} was not written to the output directory")]
    MissingArtifact(String),
}

const VERSION_TOKEN: &str = r#""%%VERSION%%""#;
const FILES_TOKEN: &str = r#""%%FILES%%""#;
const ARTIFACT_NAME_TOKEN: &str = r#""%%ARTIFACT_NAME%%""#;

/// Inputs the packager reads from the project.
#[derive(Debug, Clone, Copy)]
pub struct OfflineSources<'a> {
    pub service_worker_template: &'a Path,
    pub icon: &'a Path,
}

/// Render the appcache manifest.
pub fn appcache_manifest(version: &str, files: &OfflineFileSet) -> String {
    let mut lines = vec![
        "CACHE MANIFEST".to_string(),
        format!("# v{version}"),
        "NETWORK".to_string(),
        r#""*""#.to_string(),
        "CACHE".to_string(),
    ];
    lines.extend(files.iter().map(str::to_string));
    lines.join("\n") + "\n"
}

/// Render the service worker from its template.
pub fn service_worker(
    template: &str,
    version: &str,
    files: &OfflineFileSet,
    artifact_name: &str,
) -> Result<String, PackagingError> {
    let files_json = serde_json::to_string(files.as_slice())?;
    let name_json = serde_json::to_string(artifact_name)?;
    Ok(template
        .replace(VERSION_TOKEN, &format!("\"{version}\""))
        .replace(FILES_TOKEN, &files_json)
        .replace(ARTIFACT_NAME_TOKEN, &name_json))
}

#[derive(Debug, Serialize)]
struct WebManifest<'a> {
    name: &'a str,
    short_name: &'a str,
    display: &'static str,
    start_url: &'static str,
    icons: [WebManifestIcon; 1],
}

#[derive(Debug, Serialize)]
struct WebManifestIcon {
    src: &'static str,
    sizes: &'static str,
    #[serde(rename = "type")]
    mime: &'static str,
}

/// Render the web-app manifest as compact JSON.
pub fn web_manifest(brand: &Brand) -> Result<String, PackagingError> {
    let manifest = WebManifest {
        name: &brand.name,
        short_name: &brand.short_name,
        display: "standalone",
        start_url: artifacts::INDEX_HTML,
        icons: [WebManifestIcon {
            src: artifacts::ICON,
            sizes: "192x192",
            mime: "image/png",
        }],
    };
    Ok(serde_json::to_string(&manifest)?)
}

/// Write all offline artifacts into `target_dir`.
///
/// Returns the paths written, in the order above.
pub fn package(
    manifest: &ProjectManifest,
    names: &ArtifactNames,
    sources: OfflineSources<'_>,
    target_dir: &Path,
) -> Result<Vec<PathBuf>, PackagingError> {
    let files = names.offline_files();
    let mut written = Vec::with_capacity(4);

    let appcache = appcache_manifest(&manifest.version, &files);
    written.push(write(target_dir, artifacts::APPCACHE_MANIFEST, appcache.as_bytes())?);

    let template = fs::read_to_string(sources.service_worker_template).map_err(|source| {
        PackagingError::ReadTemplate {
            path: sources.service_worker_template.to_path_buf(),
            source,
        }
    })?;
    let sw = service_worker(&template, &manifest.version, &files, names.stem())?;
    written.push(write(target_dir, artifacts::SERVICE_WORKER, sw.as_bytes())?);

    let web = web_manifest(&manifest.brand)?;
    written.push(write(target_dir, artifacts::WEB_MANIFEST, web.as_bytes())?);

    let icon = fs::read(sources.icon).map_err(|source| PackagingError::ReadIcon {
        path: sources.icon.to_path_buf(),
        source,
    })?;
    written.push(write(target_dir, artifacts::ICON, &icon)?);

    Ok(written)
}

fn write(target_dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf, PackagingError> {
    let dest = target_dir.join(name);
    outdir::write_atomic(&dest, contents)?;
    Ok(dest)
}

/// Check that every file the offline clients will request exists.
pub fn verify_offline_files(files: &OfflineFileSet, target_dir: &Path) -> Result<(), PackagingError> {
    match files.iter().find(|name| !target_dir.join(name).is_file()) {
        Some(missing) => Err(PackagingError::MissingArtifact(missing.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{SERVICE_WORKER_TEMPLATE, test_brand, test_manifest};
    use tempfile::TempDir;

    fn files() -> OfflineFileSet {
        ArtifactNames::new("app").offline_files()
    }

    #[test]
    fn appcache_exact_format() {
        assert_eq!(
            appcache_manifest("1.4.0", &files()),
            "CACHE MANIFEST\n# v1.4.0\nNETWORK\n\"*\"\nCACHE\napp.js\napp.css\nindex.html\nicon-192.png\n"
        );
    }

    #[test]
    fn appcache_cache_section_lists_exactly_offline_files() {
        let text = appcache_manifest("2.0.0", &files());
        let cache: Vec<&str> = text
            .lines()
            .skip_while(|l| *l != "CACHE")
            .skip(1)
            .collect();
        assert_eq!(cache, vec!["app.js", "app.css", "index.html", "icon-192.png"]);
    }

    #[test]
    fn service_worker_substitutes_all_tokens() {
        let sw = service_worker(SERVICE_WORKER_TEMPLATE, "1.4.0", &files(), "app").unwrap();
        assert!(sw.contains(r#"const VERSION = "1.4.0";"#));
        assert!(sw.contains(
            r#"const FILES = ["app.js","app.css","index.html","icon-192.png"];"#
        ));
        assert!(sw.contains(r#"const ARTIFACT = "app";"#));
        assert!(!sw.contains("%%"));
    }

    #[test]
    fn service_worker_replaces_every_occurrence() {
        let template = r#"a("%%VERSION%%"); b("%%VERSION%%");"#;
        let sw = service_worker(template, "3.1.0", &files(), "app").unwrap();
        assert_eq!(sw, r#"a("3.1.0"); b("3.1.0");"#);
    }

    #[test]
    fn service_worker_leaves_unquoted_tokens() {
        let sw = service_worker("// %%VERSION%%", "3.1.0", &files(), "app").unwrap();
        assert_eq!(sw, "// %%VERSION%%");
    }

    #[test]
    fn web_manifest_exact_json() {
        let json = web_manifest(&test_brand()).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Shopping List","short_name":"Shopping","display":"standalone","start_url":"index.html","icons":[{"src":"icon-192.png","sizes":"192x192","type":"image/png"}]}"#
        );
    }

    #[test]
    fn web_manifest_round_trips() {
        let json = web_manifest(&test_brand()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Shopping List");
        assert_eq!(value["short_name"], "Shopping");
        assert_eq!(value["display"], "standalone");
        assert_eq!(value["start_url"], "index.html");
        let icons = value["icons"].as_array().unwrap();
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0]["src"], "icon-192.png");
        assert_eq!(icons[0]["sizes"], "192x192");
        assert_eq!(icons[0]["type"], "image/png");
    }

    fn package_into(tmp: &TempDir) -> Result<Vec<PathBuf>, PackagingError> {
        let sw_path = tmp.path().join("sw.template.js");
        let icon_path = tmp.path().join("icon.png");
        let target = tmp.path().join("target");
        fs::create_dir_all(&target).unwrap();
        let manifest = test_manifest();
        package(
            &manifest,
            &ArtifactNames::new(&manifest.artifact_name),
            OfflineSources {
                service_worker_template: &sw_path,
                icon: &icon_path,
            },
            &target,
        )
    }

    #[test]
    fn package_writes_all_artifacts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("sw.template.js"), SERVICE_WORKER_TEMPLATE).unwrap();
        let icon = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0x00];
        fs::write(tmp.path().join("icon.png"), icon).unwrap();

        let written = package_into(&tmp).unwrap();
        let target = tmp.path().join("target");
        assert_eq!(
            written,
            vec![
                target.join("manifest.appcache"),
                target.join("sw.js"),
                target.join("manifest.json"),
                target.join("icon-192.png"),
            ]
        );
        assert_eq!(fs::read(target.join("icon-192.png")).unwrap(), icon);
        assert!(
            fs::read_to_string(target.join("manifest.appcache"))
                .unwrap()
                .contains("# v1.4.0")
        );
    }

    #[test]
    fn package_missing_template_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("icon.png"), b"png").unwrap();
        assert!(matches!(
            package_into(&tmp),
            Err(PackagingError::ReadTemplate { .. })
        ));
    }

    #[test]
    fn package_missing_icon_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("sw.template.js"), SERVICE_WORKER_TEMPLATE).unwrap();
        assert!(matches!(
            package_into(&tmp),
            Err(PackagingError::ReadIcon { .. })
        ));
    }

    #[test]
    fn verify_reports_first_missing_file() {
        let tmp = TempDir::new().unwrap();
        for name in ["app.js", "index.html", "icon-192.png"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        let err = verify_offline_files(&files(), tmp.path()).unwrap_err();
        assert!(matches!(err, PackagingError::MissingArtifact(ref name) if name == "app.css"));

        fs::write(tmp.path().join("app.css"), "").unwrap();
        assert!(verify_offline_files(&files(), tmp.path()).is_ok());
    }
}
