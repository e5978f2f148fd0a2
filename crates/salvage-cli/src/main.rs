use clap::{Parser, Subcommand};
use miette::Result;
use salvage_build::{CompilationDatabase, ProbeMode, SalvageConfig};
use salvage_driver::{Driver, JsonRenderer, Renderer, SummaryRenderer, TablePackageResolver};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "salvage")]
#[command(author, version, about = "Recover build targets from a compilation database")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the targets recorded in a compilation database
    Analyze {
        /// compile_commands.json to read
        database: PathBuf,

        /// Config file (default: salvage.toml next to the database, if any)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Project name
        #[arg(long)]
        name: Option<String>,

        /// How to discover missing dependencies
        #[arg(long)]
        probe: Option<ProbeArg>,

        /// Upper bound on captured fields per template
        #[arg(long)]
        max_fields: Option<usize>,

        /// Output format
        #[arg(long, default_value = "summary")]
        format: OutputFormat,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ProbeArg {
    /// Never probe
    None,
    /// Ask the recorded compiler
    Compiler,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Full build description as JSON
    Json,
    /// One line per target
    Summary,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("SALVAGE_LOG").unwrap_or_else(|_| EnvFilter::new("salvage=info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            database,
            config,
            name,
            probe,
            max_fields,
            format,
            output,
        } => {
            let mut config = load_config(config.as_deref(), &database)?;
            if let Some(name) = name {
                config.project.name = Some(name);
            }
            if let Some(probe) = probe {
                config.probe.mode = match probe {
                    ProbeArg::None => ProbeMode::None,
                    ProbeArg::Compiler => ProbeMode::Compiler,
                };
            }
            if let Some(max_fields) = max_fields {
                config.pattern.max_fields = max_fields;
            }

            let db = CompilationDatabase::from_file(&database)
                .map_err(|e| miette::miette!("Failed to load {}: {}", database.display(), e))?;
            let driver = Driver::new(config);
            let root = driver.project_root(&db)?;
            let probe = driver.probe(&root);
            let description = driver.run(&db, probe.as_ref())?;

            let mut text = match format {
                OutputFormat::Json => {
                    let resolver = TablePackageResolver::new(&driver.config().packages);
                    JsonRenderer::new(&resolver).render(&description)?
                }
                OutputFormat::Summary => SummaryRenderer.render(&description)?,
            };
            if !text.ends_with('\n') {
                text.push('\n');
            }

            match output {
                Some(path) => {
                    std::fs::write(&path, &text)
                        .map_err(|e| miette::miette!("Failed to write {}: {}", path.display(), e))?;
                    tracing::info!("Wrote {} targets to {}", description.targets.len(), path.display());
                }
                None => print!("{}", text),
            }
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>, database: &Path) -> Result<SalvageConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = database
                .parent()
                .unwrap_or(Path::new("."))
                .join("salvage.toml");
            if !candidate.exists() {
                return Ok(SalvageConfig::default());
            }
            candidate
        }
    };
    SalvageConfig::from_file(&path).map_err(|e| miette::miette!("Failed to load {}: {}", path.display(), e))
}
