//! Script and style bundling.
//!
//! Each adapter takes one fixed entry file and produces one output file in the
//! target directory. The bundle is produced entirely in memory first, so an
//! engine failure leaves no file behind, and the write itself is atomic.

pub mod backend;
pub mod command;
pub mod css;

pub use backend::{BundleError, Bundler};
pub use command::CommandBundler;
pub use css::CssImportBundler;

use crate::outdir;
use std::path::{Path, PathBuf};

/// Bundle `entry` with `bundler` and write the result to `dest`.
pub fn write_bundle(
    bundler: &dyn Bundler,
    entry: &Path,
    dest: &Path,
) -> Result<PathBuf, BundleError> {
    let code = bundler.bundle(entry)?;
    outdir::write_atomic(dest, code.as_bytes())?;
    Ok(dest.to_path_buf())
}
