//! Output file names.
//!
//! Every stage that writes into the target directory, and the offline packager
//! that lists those files for caching, takes its names from here. Renaming an
//! artifact in one place therefore renames it everywhere; the offline file set
//! can never reference a file the other stages did not write.

/// Rendered HTML document.
pub const INDEX_HTML: &str = "index.html";
/// Copied application icon.
pub const ICON: &str = "icon-192.png";
/// Legacy application cache manifest.
pub const APPCACHE_MANIFEST: &str = "manifest.appcache";
/// Service worker script.
pub const SERVICE_WORKER: &str = "sw.js";
/// Web-app manifest.
pub const WEB_MANIFEST: &str = "manifest.json";

/// Files only an offline build writes.
pub const OFFLINE_ONLY: [&str; 4] = [APPCACHE_MANIFEST, SERVICE_WORKER, WEB_MANIFEST, ICON];

/// Names derived from the project's artifact stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    stem: String,
}

impl ArtifactNames {
    pub fn new(stem: impl Into<String>) -> Self {
        Self { stem: stem.into() }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// `{stem}.js`
    pub fn script(&self) -> String {
        format!("{}.js", self.stem)
    }

    /// `{stem}.css`
    pub fn style(&self) -> String {
        format!("{}.css", self.stem)
    }

    /// The first derived bundle name that is also a fixed output name.
    ///
    /// A stem like `sw` makes the script bundle and the service worker the
    /// same file, and the later write silently replaces the earlier one.
    pub fn reserved_collision(&self) -> Option<String> {
        [self.script(), self.style()]
            .into_iter()
            .find(|name| name == INDEX_HTML || OFFLINE_ONLY.contains(&name.as_str()))
    }

    /// Files an offline client must cache, in cache-manifest order.
    pub fn offline_files(&self) -> OfflineFileSet {
        OfflineFileSet(vec![
            self.script(),
            self.style(),
            INDEX_HTML.to_string(),
            ICON.to_string(),
        ])
    }
}

/// Ordered list of files cached for offline use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineFileSet(Vec<String>);

impl OfflineFileSet {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
