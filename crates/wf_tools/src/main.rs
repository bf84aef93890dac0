//! Worldforge - Development Tools

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wf_core::world::ComposeOptions;
use wf_tools::report::{self, WorldSummary};
use wf_tools::validate::validate_data_directory;

#[derive(Parser)]
#[command(name = "wf-tools")]
#[command(about = "Development tools for Worldforge data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files without composing
    Validate {
        /// Path to the data root
        #[arg(default_value = "assets/worlds")]
        root: PathBuf,
    },
    /// Compose a world and print a summary
    Compose {
        #[command(flatten)]
        target: Target,
        /// Dump the whole composed world as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compose a world and verify every region is traversable
    Verify {
        #[command(flatten)]
        target: Target,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct Target {
    /// Path to the data root
    #[arg(default_value = "assets/worlds")]
    root: PathBuf,
    /// Override the world seed
    #[arg(long)]
    seed: Option<u64>,
    /// Compose only this region (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,
}

impl Target {
    fn options(&self) -> ComposeOptions {
        ComposeOptions {
            seed: self.seed,
            regions: (!self.regions.is_empty()).then(|| self.regions.clone()),
        }
    }
}

fn print_summary(summary: &WorldSummary) {
    println!(
        "{} (seed {}, fingerprint {:016x})",
        summary.name, summary.seed, summary.fingerprint
    );
    for region in &summary.regions {
        println!(
            "  {:<16} {:>4}x{:<4} {:<10} anchors {:>2}  roads {:>2}+{:<2} unrouted {:>2}  \
             doors {:>2}  wild {:>2}  safe {:>2}",
            region.id,
            region.width,
            region.height,
            region.biome,
            region.anchors,
            region.main_roads,
            region.side_paths,
            region.unrouted,
            region.doors,
            region.wild_features,
            region.safe_zones,
        );
    }
    if summary.unresolved_connections > 0 {
        println!("  {} connection(s) unresolved", summary.unresolved_connections);
    }
}

fn run_validate(root: &Path) -> wf_tools::Result<()> {
    tracing::info!("Validating data files in: {}", root.display());
    let summary = validate_data_directory(root)?;
    tracing::info!(
        world = %summary.world,
        regions = summary.regions,
        instances = summary.instances,
        "Validation passed"
    );
    Ok(())
}

fn run_compose(target: &Target, json: bool) -> wf_tools::Result<()> {
    let (world, summary) = report::compose(&target.root, &target.options())?;
    if json {
        println!("{}", report::to_json(&world)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn run_verify(target: &Target, json: bool) -> wf_tools::Result<()> {
    let verified = report::verify(&target.root, &target.options())?;
    if json {
        println!("{}", report::to_json(&verified)?);
    } else {
        print_summary(&verified.summary);
        let validations =
            std::iter::once(&verified.validation.world).chain(&verified.validation.regions);
        for validation in validations {
            for issue in &validation.issues {
                println!("  [{:?}] {}: {}", issue.severity, validation.scope, issue.message);
            }
        }
    }
    verified.into_result().map(|_| ())
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Validate { root } => run_validate(root),
        Commands::Compose { target, json } => run_compose(target, *json),
        Commands::Verify { target, json } => run_verify(target, *json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
