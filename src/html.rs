//! HTML template transformation.
//!
//! The project's `index.html` is a working development page: it loads the
//! unbundled sources and carries inert, tagged script blocks. The build turns
//! it into the deployable page in two phases.
//!
//! ## Text phase
//!
//! Brand placeholders are replaced everywhere in the document, verbatim:
//!
//! | Token | Value |
//! |-------|-------|
//! | `%%NAME%%` | `brand.name` |
//! | `%%SHORT_NAME%%` | `brand.shortName` |
//! | `%%DESCRIPTION%%` | `brand.description` |
//!
//! Values are **not** HTML-escaped. Brand text is trusted project input, and
//! markup in it reaches the page as markup.
//!
//! ## Node phase
//!
//! Nodes are located by selector, never by position, and rewritten with
//! [lol_html](https://docs.rs/lol_html). Markup the rewrite does not touch is
//! passed through byte-for-byte.
//!
//! - `link[rel="stylesheet"]` → `href` points at the style bundle
//! - `script#main` → replaced by the script bundle plus the entry invocation
//! - conditional blocks (see [`CONDITIONAL_BLOCKS`]) → enabled or removed
//! - offline builds: `manifest` attribute on `<html>`, web-app manifest link
//!   appended to `<head>`
//!
//! Every required node must be present; a template missing one is rejected
//! with [`TemplateError::MissingNode`] and nothing is written.

use crate::artifacts::{self, ArtifactNames};
use crate::config::{BuildConfiguration, Flag};
use crate::manifest::Brand;
use crate::outdir::{self, FilesystemError};
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use maud::{PreEscaped, html};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("cannot read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("template has no node matching `{selector}`")]
    MissingNode { selector: &'static str },
    #[error("template rewrite failed: {0}")]
    Rewrite(String),
    #[error(transparent)]
    Output(#[from] FilesystemError),
}

const STYLESHEET_SELECTOR: &str = r#"link[rel="stylesheet"]"#;
const MAIN_SCRIPT_SELECTOR: &str = "script#main";
const ROOT_SELECTOR: &str = "html";
const HEAD_SELECTOR: &str = "head";

/// Inline call handing the page body to the bundled entry point.
const ENTRY_INVOCATION: &str = "main(document.body);";
const EXECUTABLE_SCRIPT_TYPE: &str = "text/javascript";

/// A script block kept and enabled only while its flag is on.
#[derive(Debug, Clone, Copy)]
pub struct ConditionalBlock {
    pub selector: &'static str,
    pub flag: Flag,
}

pub const CONDITIONAL_BLOCKS: [ConditionalBlock; 3] = [
    ConditionalBlock {
        selector: "script#phone-debug-pre",
        flag: Flag::Debug,
    },
    ConditionalBlock {
        selector: "script#phone-debug-post",
        flag: Flag::Debug,
    },
    ConditionalBlock {
        selector: "script#service-worker",
        flag: Flag::Offline,
    },
];

/// Replace the brand placeholders. Global, case-sensitive, unescaped.
pub fn substitute_placeholders(template: &str, brand: &Brand) -> String {
    template
        .replace("%%NAME%%", &brand.name)
        .replace("%%SHORT_NAME%%", &brand.short_name)
        .replace("%%DESCRIPTION%%", &brand.description)
}

/// Markup that takes the place of `script#main`.
fn main_script_markup(names: &ArtifactNames) -> String {
    html! {
        script type=(EXECUTABLE_SCRIPT_TYPE) src=(names.script()) {}
        script type=(EXECUTABLE_SCRIPT_TYPE) { (PreEscaped(ENTRY_INVOCATION)) }
    }
    .into_string()
}

fn web_manifest_link() -> String {
    html! { link rel="manifest" href=(artifacts::WEB_MANIFEST); }.into_string()
}

/// Transform template text into the final page, in memory.
pub fn render(
    template: &str,
    brand: &Brand,
    names: &ArtifactNames,
    config: &BuildConfiguration,
) -> Result<String, TemplateError> {
    let substituted = substitute_placeholders(template, brand);

    let stylesheet_href = names.style();
    let main_markup = main_script_markup(names);
    let manifest_link = web_manifest_link();
    let seen: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
    let mark = |selector: &'static str| seen.borrow_mut().push(selector);

    let mut handlers = vec![
        element!(STYLESHEET_SELECTOR, |el| {
            mark(STYLESHEET_SELECTOR);
            el.set_attribute("href", &stylesheet_href)?;
            Ok(())
        }),
        element!(MAIN_SCRIPT_SELECTOR, |el| {
            mark(MAIN_SCRIPT_SELECTOR);
            el.replace(&main_markup, ContentType::Html);
            Ok(())
        }),
    ];

    for block in CONDITIONAL_BLOCKS {
        let enabled = config.flag(block.flag);
        handlers.push(element!(block.selector, move |el| {
            mark(block.selector);
            if enabled {
                el.set_attribute("type", EXECUTABLE_SCRIPT_TYPE)?;
            } else {
                el.remove();
            }
            Ok(())
        }));
    }

    if config.offline {
        handlers.push(element!(ROOT_SELECTOR, |el| {
            mark(ROOT_SELECTOR);
            el.set_attribute("manifest", artifacts::APPCACHE_MANIFEST)?;
            Ok(())
        }));
        handlers.push(element!(HEAD_SELECTOR, |el| {
            mark(HEAD_SELECTOR);
            el.append(&manifest_link, ContentType::Html);
            Ok(())
        }));
    }

    let output = rewrite_str(
        &substituted,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| TemplateError::Rewrite(e.to_string()))?;

    let seen = seen.into_inner();
    for selector in required_selectors(config) {
        if !seen.contains(&selector) {
            return Err(TemplateError::MissingNode { selector });
        }
    }
    Ok(output)
}

fn required_selectors(config: &BuildConfiguration) -> Vec<&'static str> {
    let mut selectors = vec![STYLESHEET_SELECTOR, MAIN_SCRIPT_SELECTOR];
    selectors.extend(CONDITIONAL_BLOCKS.iter().map(|b| b.selector));
    if config.offline {
        selectors.extend([ROOT_SELECTOR, HEAD_SELECTOR]);
    }
    selectors
}

/// Read the template, render it, and write `index.html` into `target_dir`.
///
/// Returns the path written.
pub fn build_html(
    template_path: &Path,
    target_dir: &Path,
    brand: &Brand,
    names: &ArtifactNames,
    config: &BuildConfiguration,
) -> Result<PathBuf, TemplateError> {
    let template = fs::read_to_string(template_path).map_err(|source| TemplateError::Read {
        path: template_path.to_path_buf(),
        source,
    })?;
    let page = render(&template, brand, names, config)?;
    let dest = target_dir.join(artifacts::INDEX_HTML);
    outdir::write_atomic(&dest, page.as_bytes())?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{TEMPLATE, test_brand};
    use tempfile::TempDir;

    const RELEASE: BuildConfiguration = BuildConfiguration {
        debug: false,
        offline: false,
    };
    const DEBUG_OFFLINE: BuildConfiguration = BuildConfiguration {
        debug: true,
        offline: true,
    };

    fn names() -> ArtifactNames {
        ArtifactNames::new("app")
    }

    fn render_with(config: &BuildConfiguration) -> String {
        render(TEMPLATE, &test_brand(), &names(), config).unwrap()
    }

    // =========================================================================
    // Placeholder substitution
    // =========================================================================

    #[test]
    fn placeholders_replaced_globally() {
        let brand = test_brand();
        let out = substitute_placeholders("%%NAME%% / %%NAME%% / %%SHORT_NAME%% / %%DESCRIPTION%%", &brand);
        assert_eq!(
            out,
            "Shopping List / Shopping List / Shopping / Lists & <b>more</b>"
        );
    }

    #[test]
    fn placeholders_are_case_sensitive() {
        let out = substitute_placeholders("%%name%%", &test_brand());
        assert_eq!(out, "%%name%%");
    }

    #[test]
    fn rendered_page_has_no_placeholders_left() {
        let out = render_with(&DEBUG_OFFLINE);
        assert!(!out.contains("%%NAME%%"));
        assert!(!out.contains("%%SHORT_NAME%%"));
        assert!(!out.contains("%%DESCRIPTION%%"));
        assert!(out.contains("<title>Shopping List</title>"));
        assert!(out.contains(r#"content="Shopping""#));
    }

    #[test]
    fn brand_values_inserted_unescaped() {
        let out = render_with(&RELEASE);
        assert!(out.contains("Lists & <b>more</b>"));
        assert!(!out.contains("&amp;"));
    }

    // =========================================================================
    // Node rewrites
    // =========================================================================

    #[test]
    fn stylesheet_points_at_bundle() {
        let out = render_with(&RELEASE);
        assert!(out.contains(r#"href="app.css""#));
        assert!(!out.contains("src/css/main.css"));
    }

    #[test]
    fn main_script_replaced_with_bundle_and_invocation() {
        let out = render_with(&RELEASE);
        assert!(out.contains(
            r#"<script type="text/javascript" src="app.js"></script><script type="text/javascript">main(document.body);</script>"#
        ));
        assert!(!out.contains(r#"id="main""#));
    }

    #[test]
    fn debug_blocks_enabled_when_debug() {
        let out = render_with(&DEBUG_OFFLINE);
        assert!(out.contains(r#"<script id="phone-debug-pre" type="text/javascript">"#));
        assert!(out.contains(r#"<script id="phone-debug-post" type="text/javascript">"#));
    }

    #[test]
    fn debug_blocks_removed_when_not_debug() {
        let out = render_with(&RELEASE);
        assert!(!out.contains("phone-debug-pre"));
        assert!(!out.contains("phone-debug-post"));
        assert!(!out.contains("debugConsole"));
    }

    #[test]
    fn offline_enables_service_worker_and_manifests() {
        let out = render_with(&DEBUG_OFFLINE);
        assert!(out.contains(r#"<script id="service-worker" type="text/javascript">"#));
        assert!(out.contains(r#"manifest="manifest.appcache""#));
        assert!(out.contains(r#"<link rel="manifest" href="manifest.json"></head>"#));
    }

    #[test]
    fn online_removes_service_worker_and_manifests() {
        let out = render_with(&RELEASE);
        assert!(!out.contains("service-worker"));
        assert!(!out.contains("manifest="));
        assert!(!out.contains("manifest.json"));
    }

    #[test]
    fn untouched_markup_preserved() {
        let out = render_with(&RELEASE);
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains(r#"<div id="app-root" class="loading"></div>"#));
    }

    // =========================================================================
    // Malformed templates
    // =========================================================================

    #[test]
    fn missing_main_script_is_error() {
        let template = TEMPLATE.replace(r#"id="main""#, r#"id="other""#);
        let err = render(&template, &test_brand(), &names(), &RELEASE).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingNode {
                selector: "script#main"
            }
        ));
    }

    #[test]
    fn missing_conditional_block_is_error_even_when_disabled() {
        let template = TEMPLATE.replace(r#"id="phone-debug-post""#, "");
        let err = render(&template, &test_brand(), &names(), &RELEASE).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingNode {
                selector: "script#phone-debug-post"
            }
        ));
    }

    #[test]
    fn missing_stylesheet_is_error() {
        let template = TEMPLATE.replace(r#"rel="stylesheet""#, r#"rel="preload""#);
        assert!(render(&template, &test_brand(), &names(), &RELEASE).is_err());
    }

    // =========================================================================
    // build_html
    // =========================================================================

    #[test]
    fn build_html_writes_index() {
        let tmp = TempDir::new().unwrap();
        let template_path = tmp.path().join("index.html");
        let target = tmp.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(&template_path, TEMPLATE).unwrap();

        let dest = build_html(&template_path, &target, &test_brand(), &names(), &RELEASE).unwrap();
        assert_eq!(dest, target.join("index.html"));
        assert!(fs::read_to_string(dest).unwrap().contains("app.js"));
    }

    #[test]
    fn build_html_malformed_template_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let template_path = tmp.path().join("index.html");
        let target = tmp.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(&template_path, "<html><head></head><body></body></html>").unwrap();

        let err = build_html(&template_path, &target, &test_brand(), &names(), &RELEASE);
        assert!(matches!(err, Err(TemplateError::MissingNode { .. })));
        assert!(fs::read_dir(&target).unwrap().next().is_none());
    }

    #[test]
    fn build_html_missing_template_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = build_html(
            &tmp.path().join("missing.html"),
            tmp.path(),
            &test_brand(),
            &names(),
            &RELEASE,
        );
        assert!(matches!(err, Err(TemplateError::Read { .. })));
    }
}
