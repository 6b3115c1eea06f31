use clap::{Parser, Subcommand};
use sitepack::bundle::{CommandBundler, CssImportBundler};
use sitepack::config::{self, PipelineConfig};
use sitepack::output;
use sitepack::pipeline::{Pipeline, ProjectLayout};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sitepack")]
#[command(about = "Build a static web app into a deployable, offline-capable bundle")]
#[command(long_about = "\
Build a static web app into a deployable, offline-capable bundle

Project structure (paths configurable in sitepack.toml):

  project/
  ├── package.json                     # version, brand.*, build.artifactName
  ├── sitepack.toml                    # Optional build config
  ├── index.html                       # Template with %%NAME%% placeholders
  ├── icon.png                         # Copied to icon-192.png (offline)
  └── src/
      ├── main.js                      # Script entry → {artifactName}.js
      ├── css/main.css                 # Style entry  → {artifactName}.css
      └── service-worker.template.js   # Rendered to sw.js (offline)

Every build deletes and recreates the target directory.

Run 'sitepack gen-config' to print a documented sitepack.toml.")]
#[command(version)]
struct Cli {
    /// Project root directory
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Keep and enable the phone-debug script blocks
    #[arg(long, global = true)]
    debug: bool,

    /// Skip offline packaging
    #[arg(long, global = true)]
    no_offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full build (default)
    Build,
    /// Validate the descriptor and template without writing anything
    Check,
    /// Print a stock sitepack.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let (pipeline, pipeline_config) = load_pipeline(&cli.project, cli.debug, cli.no_offline)?;
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_build_event(&event);
                }
            });
            // `run` consumes the sender, so the printer exits once the build returns.
            let result = pipeline.run(Some(tx));
            let _ = printer.join();
            let report = result?;
            output::print_report(&report, &pipeline_config.paths.target);
        }
        Command::Check => {
            let (pipeline, _) = load_pipeline(&cli.project, cli.debug, cli.no_offline)?;
            println!(
                "{}",
                output::format_check_banner(&pipeline.layout().root, pipeline.config())
            );
            let manifest = pipeline.check()?;
            println!(
                "==> {} {} is valid",
                manifest.display_name(),
                manifest.version
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

/// Resolve the project root, load its config, and fold in CLI flags.
fn load_pipeline(
    project: &Path,
    debug: bool,
    no_offline: bool,
) -> Result<(Pipeline, PipelineConfig), Box<dyn std::error::Error>> {
    let root = project.canonicalize()?;
    let mut pipeline_config = config::load_config(&root)?;
    apply_overrides(&mut pipeline_config, debug, no_offline);
    Ok((build_pipeline(&root, &pipeline_config), pipeline_config))
}

/// Fold CLI flags into the loaded config. Runs once, before the build starts.
fn apply_overrides(config: &mut PipelineConfig, debug: bool, no_offline: bool) {
    if debug {
        config.build.debug = true;
    }
    if no_offline {
        config.build.offline = false;
    }
}

fn build_pipeline(root: &Path, config: &PipelineConfig) -> Pipeline {
    let layout = ProjectLayout::new(root, &config.paths);
    Pipeline::new(
        config.build,
        layout,
        Box::new(CommandBundler::new(&config.script_bundler, root)),
        Box::new(CssImportBundler),
    )
}
