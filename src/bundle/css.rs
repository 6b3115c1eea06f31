//! Stylesheet `@import` flattening via [lightningcss](https://lightningcss.dev).
//!
//! The entry stylesheet and every file it imports, transitively, are merged
//! into one stylesheet. Output is printed unminified; a parse error or an
//! unresolved import fails the bundle with lightningcss's diagnostic.

use super::backend::{BundleError, Bundler};
use lightningcss::bundler::{Bundler as ImportBundler, FileProvider};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::ParserOptions;
use std::path::Path;

const ENGINE: &str = "lightningcss";

#[derive(Debug, Clone, Copy, Default)]
pub struct CssImportBundler;

impl CssImportBundler {
    fn engine_error(message: impl ToString) -> BundleError {
        BundleError::Engine {
            engine: ENGINE.to_string(),
            message: message.to_string(),
        }
    }
}

impl Bundler for CssImportBundler {
    fn name(&self) -> &str {
        ENGINE
    }

    fn bundle(&self, entry: &Path) -> Result<String, BundleError> {
        let provider = FileProvider::new();
        let mut bundler = ImportBundler::new(&provider, None, ParserOptions::default());
        let stylesheet = bundler.bundle(entry).map_err(Self::engine_error)?;
        let printed = stylesheet
            .to_css(PrinterOptions::default())
            .map_err(Self::engine_error)?;
        Ok(printed.code)
    }
}
