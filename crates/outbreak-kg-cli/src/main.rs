//! outbreak-kg CLI - build an outbreak knowledge graph from alert mentions

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use outbreak_kg_core::commands::{
    self, BuildReport, BuildRequest, BuildTarget, ClassificationReport, StatusReport, TableState,
};
use outbreak_kg_core::config::Config;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "outbreak-kg")]
#[command(author, version, about = "Outbreak knowledge graph builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, clap::ValueEnum)]
enum TargetArg {
    #[default]
    All,
    Cooccurrence,
    Hierarchy,
    Mentions,
}

impl From<TargetArg> for BuildTarget {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::All => BuildTarget::All,
            TargetArg::Cooccurrence => BuildTarget::Cooccurrence,
            TargetArg::Hierarchy => BuildTarget::Hierarchy,
            TargetArg::Mentions => BuildTarget::Mentions,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble graphs and publish their node/edge tables
    Build {
        /// Which graph to build
        #[arg(value_enum, default_value = "all")]
        target: TargetArg,
        /// Mentions file (JSON map of archive number to grounded terms)
        #[arg(short, long)]
        mentions: Option<PathBuf>,
        /// Ontology term file (defaults to ontology.path)
        #[arg(long)]
        ontology: Option<PathBuf>,
        /// Output directory (defaults to export.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the tables published to an output directory
    Status {
        /// Output directory (defaults to export.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify a single concept
    Classify {
        /// Curie namespace, e.g. MESH
        namespace: String,
        /// Concept identifier, e.g. D004534
        identifier: String,
        /// Ontology term file (defaults to ontology.path)
        #[arg(long)]
        ontology: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays parseable with --format json
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("outbreak_kg=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    debug!(path = %config_path.display(), "Using configuration file");

    match cli.command {
        Commands::Build {
            target,
            mentions,
            ontology,
            output,
        } => {
            let request = BuildRequest {
                target: target.into(),
                ontology,
                mentions,
                output_dir: output,
            };
            cmd_build(&config_path, &request, cli.format, cli.quiet)
        }

        Commands::Status { output } => {
            cmd_status(&config_path, output.as_deref(), cli.format, cli.quiet)
        }

        Commands::Classify {
            namespace,
            identifier,
            ontology,
        } => cmd_classify(
            &config_path,
            &namespace,
            &identifier,
            ontology.as_deref(),
            cli.format,
            cli.quiet,
        ),

        Commands::Config { action } => cmd_config(&config_path, action, cli.format, cli.quiet),
    }
}

/// Attach the error code and suggestion to a library error
fn core_error(error: outbreak_kg_core::Error) -> anyhow::Error {
    match error.suggestion() {
        Some(suggestion) => anyhow::anyhow!(
            "[{}] {}\n\nSuggestion: {}",
            error.code(),
            error,
            suggestion
        ),
        None => anyhow::anyhow!("[{}] {}", error.code(), error),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command Implementations
// ============================================================================

fn cmd_build(
    config_path: &Path,
    request: &BuildRequest,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = Config::load_from(config_path)?;
    let report = commands::build(&config, request).map_err(core_error)?;

    if format == OutputFormat::Json {
        return print_json(&report);
    }
    if !quiet {
        print_build_report(&report);
    }
    Ok(())
}

fn print_build_report(report: &BuildReport) {
    println!(
        "Built {} into {}",
        report.target,
        report.output_dir.display()
    );
    if report.target.needs_mentions() {
        println!("  Documents: {}", report.documents);
    }
    if !report.skipped_documents.is_empty() {
        println!(
            "  Skipped malformed documents: {}",
            report.skipped_documents.join(", ")
        );
    }
    if let Some(stats) = &report.cooccurrence {
        println!(
            "  Co-occurrence: {} candidate pairs, {} occurrences, {} stoplisted mentions",
            stats.candidate_pairs, stats.occurrences, stats.excluded_mentions
        );
    }
    if let Some(stats) = &report.hierarchy {
        println!(
            "  Hierarchy: {} of {} terms typed, {} dangling parents",
            stats.classified, stats.terms, stats.dangling_parents
        );
    }
    if let Some(stats) = &report.mentions {
        println!(
            "  Mentions: {} untyped, {} stoplisted mentions",
            stats.untyped_mentions, stats.excluded_mentions
        );
    }
    println!();
    for table in &report.tables {
        println!("  {:<28} {:>8} rows", table.file_name, table.rows);
    }
    println!("\nTotal rows in manifest: {}", report.total_rows);
}

fn cmd_status(
    config_path: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let output_dir = match output {
        Some(dir) => dir.to_path_buf(),
        None => Config::load_from(config_path)?.export.output_dir,
    };
    let report = commands::status(&output_dir).map_err(core_error)?;

    if format == OutputFormat::Json {
        return print_json(&report);
    }
    if !quiet {
        print_status_report(&report);
    }
    Ok(())
}

fn print_status_report(report: &StatusReport) {
    println!("Output: {}", report.output_dir.display());
    println!("Last export: {}", report.exported_at.to_rfc3339());
    println!();
    for table in &report.tables {
        let marker = match table.state {
            TableState::Current => "[OK]",
            TableState::Modified | TableState::Missing => "[!!]",
        };
        println!(
            "{} {:<28} {:>8} rows  {}",
            marker,
            table.file_name,
            table.rows,
            table.state.as_str()
        );
    }
    println!("\nTotal rows: {}", report.total_rows);
    if !report.is_clean() {
        warn!("Some tables differ from the manifest");
        println!("Some tables changed since export. Re-run `outbreak-kg build`.");
    }
}

fn cmd_classify(
    config_path: &Path,
    namespace: &str,
    identifier: &str,
    ontology: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = Config::load_from(config_path)?;
    let report =
        commands::classify(&config, ontology, namespace, identifier).map_err(core_error)?;

    if format == OutputFormat::Json {
        return print_json(&report);
    }
    if quiet {
        println!("{}", report.display_type);
    } else {
        print_classification(&report);
    }
    Ok(())
}

fn print_classification(report: &ClassificationReport) {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    match &report.name {
        Some(name) => println!("{} ({})", report.curie, name),
        None => println!("{} (unknown term)", report.curie),
    }
    println!("  disease:      {}", yes_no(report.flags.disease));
    println!("  pathogen:     {}", yes_no(report.flags.pathogen));
    println!("  geolocation:  {}", yes_no(report.flags.geolocation));
    println!("  co-occurrence type: {}", report.cooccurrence_type);
    println!("  display type:       {}", report.display_type);
}

fn cmd_config(
    config_path: &Path,
    action: ConfigAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_from(config_path)?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(config_path)?;
            config.set(&key, &value)?;
            config.save_to(config_path)?;
            if !quiet {
                println!("Set {} = {}", key, config.get(&key)?);
            }
        }
        ConfigAction::List => {
            let config = Config::load_from(config_path)?;
            let items = config.list()?;
            if format == OutputFormat::Json {
                let map: serde_json::Map<String, serde_json::Value> = items
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::String(value)))
                    .collect();
                return print_json(&map);
            }
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset_at(config_path)?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}
