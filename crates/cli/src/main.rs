use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    skillpack_build::{
        error::BuildError,
        package::{BuildOptions, package_skill},
        scaffold::init_skill,
    },
    skillpack_manifest::validate::ValidationError,
};

#[derive(Parser)]
#[command(name = "skillpack", about = "Build and preview skills")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a skill directory into a distributable archive.
    Package {
        /// Skill root directory.
        root: PathBuf,
        /// Output directory for the artifact (default: <root>/dist).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Overwrite an existing artifact with the same name and version.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Create a new skill skeleton from the built-in scaffold.
    Init {
        /// Directory to create the skill in.
        target: PathBuf,
        /// Name of the new skill.
        name: String,
        /// Allow scaffolding into a non-empty directory.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Run the preview server until terminated.
    Preview {
        /// Directory containing one or more skills.
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Port to listen on.
        #[arg(long, env = "SKILLPACK_PREVIEW_PORT", default_value_t = skillpack_preview::DEFAULT_PORT)]
        port: u16,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Print the aggregated validation list and exit non-zero.
fn report_validation_failure(errors: &[ValidationError]) -> ! {
    eprintln!("manifest validation failed:");
    for error in errors {
        eprintln!("  {error}");
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "skillpack starting");

    match cli.command {
        Commands::Package {
            root,
            output,
            force,
        } => {
            let output_dir = output.unwrap_or_else(|| root.join("dist"));
            match package_skill(&root, &BuildOptions { output_dir, force }) {
                Ok(artifact) => {
                    println!(
                        "packaged {}-{} ({} files) -> {}",
                        artifact.name,
                        artifact.version,
                        artifact.file_count,
                        artifact.path.display()
                    );
                    Ok(())
                },
                Err(BuildError::Validation(errors)) => report_validation_failure(&errors),
                Err(e) => Err(e.into()),
            }
        },
        Commands::Init {
            target,
            name,
            force,
        } => match init_skill(&target, &name, force) {
            Ok(()) => {
                println!("created skill '{name}' in {}", target.display());
                Ok(())
            },
            Err(BuildError::Validation(errors)) => report_validation_failure(&errors),
            Err(e) => Err(e.into()),
        },
        Commands::Preview { root, port } => skillpack_preview::serve(root, port).await,
    }
}
