//! Bundler trait and shared error type.
//!
//! Both adapters wrap exactly one call into an engine that does the real work:
//!
//! - [`CommandBundler`](super::command::CommandBundler) runs the external
//!   script bundler and captures its output.
//! - [`CssImportBundler`](super::css::CssImportBundler) flattens `@import`
//!   chains in-process.
//!
//! A bundler only ever produces text in memory; writing it out is
//! [`write_bundle`](super::write_bundle)'s job.

use crate::outdir::FilesystemError;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("cannot launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{engine} failed: {message}")]
    Engine { engine: String, message: String },
    #[error("{engine} produced an empty bundle")]
    EmptyOutput { engine: String },
    #[error(transparent)]
    Output(#[from] FilesystemError),
}

/// Turns an entry file into one self-contained bundle.
///
/// `Sync` so the script and style bundles can be produced concurrently.
pub trait Bundler: Send + Sync {
    /// Engine name used in diagnostics.
    fn name(&self) -> &str;

    /// Bundle `entry` and everything it pulls in.
    fn bundle(&self, entry: &Path) -> Result<String, BundleError>;
}
