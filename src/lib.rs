//! # sitepack
//!
//! A static-site build pipeline. It takes a project's HTML template, script
//! and stylesheet entry points, and `package.json`, and produces a deployable
//! single-page bundle that can optionally install and run offline.
//!
//! # Architecture: Linear Pipeline
//!
//! ```text
//! 1. Load manifest     package.json      →  ProjectManifest
//! 2. Reset output      target/           →  empty directory
//! 3. Generate assets   index.html        →  target/index.html
//!                      src/main.js       →  target/{artifact}.js
//!                      src/css/main.css  →  target/{artifact}.css
//! 4. Package offline   (offline builds)  →  manifest.appcache, sw.js,
//!                                           manifest.json, icon-192.png
//! ```
//!
//! Every build starts from an empty target directory and either completes
//! or stops at the first error. Nothing is incremental; re-running a build
//! is always safe.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manifest`] | Loads and validates the project descriptor |
//! | [`config`] | Build switches, optional `sitepack.toml`, conventional paths |
//! | [`artifacts`] | Output file names and the offline file set |
//! | [`outdir`] | Target directory reset and atomic writes |
//! | [`html`] | Template placeholder substitution and node rewriting |
//! | [`bundle`] | Script and stylesheet bundler adapters |
//! | [`offline`] | Appcache, service worker, web-app manifest, icon |
//! | [`pipeline`] | Stage sequencing, progress events, build report |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Engines Stay Outside
//!
//! Resolving a JavaScript module graph is a job for a real bundler. The
//! script adapter runs one as an external program and treats its stdout as
//! the bundle. Stylesheet `@import` flattening runs in-process through
//! lightningcss. Neither adapter transforms the result.
//!
//! ## One Source of File Names
//!
//! The offline cache lists files by name, so a renamed artifact that the
//! list does not follow turns into a silently broken offline install.
//! [`artifacts::ArtifactNames`] derives every output name from the one
//! artifact stem, and the offline stage verifies each listed file exists
//! before the build is declared successful.
//!
//! ## Configuration Is Frozen
//!
//! [`config::BuildConfiguration`] is built once in `main`, after the config
//! file and CLI flags are merged, and every stage receives it by shared
//! reference. Stages declare whether they apply to it instead of branching
//! inside one long build function.
//!
//! ## Brand Text Is Not Escaped
//!
//! Brand values from `package.json` are substituted into the template
//! verbatim. They are project-owned input; markup in them is kept as markup.

pub mod artifacts;
pub mod bundle;
pub mod config;
pub mod html;
pub mod manifest;
pub mod offline;
pub mod outdir;
pub mod output;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_helpers;
