//! Build orchestration.
//!
//! A build is a linear state machine:
//!
//! ```text
//! LoadManifest → ResetOutput → GenerateAssets → PackageOffline → Done
//!       │             │              │                │
//!       └─────────────┴──────────────┴────────────────┴──→ Failed
//! ```
//!
//! The manifest is loaded first because every later stage reads it. The
//! remaining stages implement [`Stage`]; each declares whether it applies to
//! the current [`BuildConfiguration`], and the orchestrator settles the
//! skip/run decision for every stage once, before any of them runs.
//!
//! The first error ends the build. There is no retry and no partial recovery:
//! a build is cheap to re-run from scratch, and the next run starts by
//! deleting whatever this one left behind.
//!
//! ## Generate Assets
//!
//! The page is rendered and written before either bundle, so a malformed
//! template fails the build before any output file exists. The script and
//! style bundles have no data dependency on each other and run concurrently.

use crate::artifacts::ArtifactNames;
use crate::bundle::{self, BundleError, Bundler};
use crate::config::{BuildConfiguration, PathsConfig};
use crate::html::{self, TemplateError};
use crate::manifest::{self, ManifestError, ProjectManifest};
use crate::offline::{self, OfflineSources, PackagingError};
use crate::outdir::{self, FilesystemError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error(transparent)]
    Packaging(#[from] PackagingError),
}

/// Where a build is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    LoadManifest,
    ResetOutput,
    GenerateAssets,
    PackageOffline,
    Done,
    Failed,
}

impl BuildState {
    pub fn label(&self) -> &'static str {
        match self {
            BuildState::LoadManifest => "Loading manifest",
            BuildState::ResetOutput => "Resetting output directory",
            BuildState::GenerateAssets => "Generating assets",
            BuildState::PackageOffline => "Packaging offline assets",
            BuildState::Done => "Done",
            BuildState::Failed => "Failed",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A failed build: the stage that failed and why.
#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct BuildFailure {
    pub stage: BuildState,
    #[source]
    pub error: BuildError,
}

/// Progress reported while a build runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    StageStarted(BuildState),
    StageSkipped(BuildState),
    ArtifactWritten { file: String },
    Failed { stage: BuildState, message: String },
    Finished { name: String, version: String },
}

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub name: String,
    pub version: String,
    /// Stages whose predicate excluded them from this build.
    pub skipped: Vec<BuildState>,
    /// Every file in the target directory, sorted.
    pub outputs: Vec<String>,
}

/// Resolved input and output locations for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub manifest: PathBuf,
    pub template: PathBuf,
    pub script_entry: PathBuf,
    pub style_entry: PathBuf,
    pub service_worker: PathBuf,
    pub icon: PathBuf,
    pub target: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: &Path, paths: &PathsConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            manifest: root.join(&paths.manifest),
            template: root.join(&paths.template),
            script_entry: root.join(&paths.script_entry),
            style_entry: root.join(&paths.style_entry),
            service_worker: root.join(&paths.service_worker),
            icon: root.join(&paths.icon),
            target: root.join(&paths.target),
        }
    }
}

/// Everything a stage can read. Nothing in it is mutable.
pub struct BuildContext<'a> {
    pub manifest: &'a ProjectManifest,
    pub names: &'a ArtifactNames,
    pub config: &'a BuildConfiguration,
    pub layout: &'a ProjectLayout,
    pub script_bundler: &'a dyn Bundler,
    pub style_bundler: &'a dyn Bundler,
    events: Option<&'a Sender<BuildEvent>>,
}

impl BuildContext<'_> {
    fn emit(&self, event: BuildEvent) {
        emit(self.events, event);
    }

    fn written(&self, path: &Path) {
        let file = path
            .strip_prefix(&self.layout.target)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();
        self.emit(BuildEvent::ArtifactWritten { file });
    }
}

fn emit(events: Option<&Sender<BuildEvent>>, event: BuildEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(event);
    }
}

/// One step of the build after the manifest is loaded.
pub trait Stage {
    fn state(&self) -> BuildState;

    /// Whether this stage runs for the given configuration.
    fn applies(&self, _config: &BuildConfiguration) -> bool {
        true
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError>;
}

/// Empties and recreates the target directory.
pub struct ResetOutput;

impl Stage for ResetOutput {
    fn state(&self) -> BuildState {
        BuildState::ResetOutput
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
        outdir::reset(&ctx.layout.target)?;
        Ok(())
    }
}

/// Writes the page and both bundles.
pub struct GenerateAssets;

impl Stage for GenerateAssets {
    fn state(&self) -> BuildState {
        BuildState::GenerateAssets
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
        let target = &ctx.layout.target;
        let page = html::build_html(
            &ctx.layout.template,
            target,
            &ctx.manifest.brand,
            ctx.names,
            ctx.config,
        )?;
        ctx.written(&page);

        let script_dest = target.join(ctx.names.script());
        let style_dest = target.join(ctx.names.style());
        let (script, style) = rayon::join(
            || bundle::write_bundle(ctx.script_bundler, &ctx.layout.script_entry, &script_dest),
            || bundle::write_bundle(ctx.style_bundler, &ctx.layout.style_entry, &style_dest),
        );
        ctx.written(&script?);
        ctx.written(&style?);
        Ok(())
    }
}

/// Writes the offline artifacts and checks the offline file set is complete.
pub struct PackageOffline;

impl Stage for PackageOffline {
    fn state(&self) -> BuildState {
        BuildState::PackageOffline
    }

    fn applies(&self, config: &BuildConfiguration) -> bool {
        config.offline
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
        let sources = OfflineSources {
            service_worker_template: &ctx.layout.service_worker,
            icon: &ctx.layout.icon,
        };
        let written = offline::package(ctx.manifest, ctx.names, sources, &ctx.layout.target)?;
        for path in &written {
            ctx.written(path);
        }
        offline::verify_offline_files(&ctx.names.offline_files(), &ctx.layout.target)?;
        Ok(())
    }
}

/// The build orchestrator.
pub struct Pipeline {
    config: BuildConfiguration,
    layout: ProjectLayout,
    script_bundler: Box<dyn Bundler>,
    style_bundler: Box<dyn Bundler>,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(
        config: BuildConfiguration,
        layout: ProjectLayout,
        script_bundler: Box<dyn Bundler>,
        style_bundler: Box<dyn Bundler>,
    ) -> Self {
        Self {
            config,
            layout,
            script_bundler,
            style_bundler,
            stages: vec![
                Box::new(ResetOutput),
                Box::new(GenerateAssets),
                Box::new(PackageOffline),
            ],
        }
    }

    pub fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Run the build to completion or to the first failure.
    pub fn run(&self, events: Option<Sender<BuildEvent>>) -> Result<BuildReport, BuildFailure> {
        let events = events.as_ref();
        let fail = |stage: BuildState, error: BuildError| {
            emit(
                events,
                BuildEvent::Failed {
                    stage,
                    message: error.to_string(),
                },
            );
            BuildFailure { stage, error }
        };

        emit(events, BuildEvent::StageStarted(BuildState::LoadManifest));
        let manifest = manifest::load_manifest(&self.layout.manifest)
            .map_err(|e| fail(BuildState::LoadManifest, e.into()))?;
        let names = ArtifactNames::new(&manifest.artifact_name);

        let plan: Vec<(&dyn Stage, bool)> = self
            .stages
            .iter()
            .map(|stage| (stage.as_ref(), stage.applies(&self.config)))
            .collect();

        let ctx = BuildContext {
            manifest: &manifest,
            names: &names,
            config: &self.config,
            layout: &self.layout,
            script_bundler: self.script_bundler.as_ref(),
            style_bundler: self.style_bundler.as_ref(),
            events,
        };

        let mut skipped = Vec::new();
        let mut last = BuildState::LoadManifest;
        for (stage, applies) in plan {
            let state = stage.state();
            if !applies {
                emit(events, BuildEvent::StageSkipped(state));
                skipped.push(state);
                continue;
            }
            emit(events, BuildEvent::StageStarted(state));
            stage.run(&ctx).map_err(|e| fail(state, e))?;
            last = state;
        }

        let outputs =
            outdir::list_outputs(&self.layout.target).map_err(|e| fail(last, e.into()))?;
        emit(
            events,
            BuildEvent::Finished {
                name: manifest.display_name().to_string(),
                version: manifest.version.clone(),
            },
        );
        Ok(BuildReport {
            name: manifest.display_name().to_string(),
            version: manifest.version.clone(),
            skipped,
            outputs,
        })
    }

    /// Load the manifest and render the page in memory. Writes nothing.
    pub fn check(&self) -> Result<ProjectManifest, BuildFailure> {
        let manifest = manifest::load_manifest(&self.layout.manifest).map_err(|e| BuildFailure {
            stage: BuildState::LoadManifest,
            error: e.into(),
        })?;
        let names = ArtifactNames::new(&manifest.artifact_name);
        let to_failure = |error: TemplateError| BuildFailure {
            stage: BuildState::GenerateAssets,
            error: error.into(),
        };
        let template = std::fs::read_to_string(&self.layout.template).map_err(|source| {
            to_failure(TemplateError::Read {
                path: self.layout.template.clone(),
                source,
            })
        })?;
        html::render(&template, &manifest.brand, &names, &self.config).map_err(to_failure)?;
        Ok(manifest)
    }
}
