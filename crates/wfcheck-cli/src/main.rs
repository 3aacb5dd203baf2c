//! wfcheck CLI - inspect the metadata of actions used by workflows

mod json;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use std::process;
use wfcheck_core::{
    resolve_references, ActionCacheRegistry, ActionMetadata, CheckConfig, Project,
    ResolveReport,
};

/// Config file looked up in the project root when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = ".wfcheck.toml";

#[derive(Parser)]
#[command(name = "wfcheck")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Resolve workflow action references to their metadata",
    long_about = "Resolve `uses:` action references to the inputs and outputs their action.yml declares.\n\nLocal references (./path) are read from the project; remote and docker references have no local metadata."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Action references to resolve (e.g. ./.github/actions/setup)
    refs: Vec<String>,

    /// Project root (defaults to the repository containing the current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Print action cache events to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve action references
    Resolve {
        /// Action references to resolve
        #[arg(required = true)]
        refs: Vec<String>,
    },

    /// Initialize config file
    Init {
        /// Output path for config
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Some(Commands::Resolve { refs }) => resolve_command(refs, &cli),
        Some(Commands::Init { output }) => init_command(output),
        None => resolve_command(&cli.refs, &cli),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Returns `Ok(false)` when any reference failed to resolve
fn resolve_command(refs: &[String], cli: &Cli) -> anyhow::Result<bool> {
    let cwd = std::env::current_dir()?;
    let project = match &cli.project {
        Some(root) => Some(Project::new(root)),
        None => Project::discover(&cwd),
    };
    if project.is_none() {
        tracing::warn!(
            cwd = %cwd.display(),
            "no project found, local actions will not be resolved"
        );
    }

    let config_path = cli.config.clone().or_else(|| {
        project
            .as_ref()
            .map(|p| p.root().join(DEFAULT_CONFIG_FILE))
            .filter(|p| p.is_file())
    });
    let mut config = match &config_path {
        Some(path) => CheckConfig::load(path)?,
        None => CheckConfig::default(),
    };
    config.debug |= cli.debug;

    let registry = ActionCacheRegistry::from_config(&cwd, &config);
    let cache = registry.get_cache(project.as_ref());
    let report = resolve_references(&cache, refs, &config);

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json::report_to_json(&report))?);
        }
        OutputFormat::Text => print_text(&report, cli.verbose),
    }

    Ok(report.diagnostics.is_empty())
}

fn print_text(report: &ResolveReport, verbose: bool) {
    for resolution in &report.resolutions {
        match &resolution.metadata {
            Some(meta) => print_metadata(&resolution.reference, meta),
            None => println!(
                "{} {}",
                resolution.reference.bold(),
                "(no metadata)".dimmed()
            ),
        }
    }

    if report.diagnostics.is_empty() {
        return;
    }
    println!();
    for diag in &report.diagnostics {
        println!(
            "{}: {}: {}",
            diag.reference,
            "error".red().bold(),
            diag.message
        );
        if verbose {
            println!("  {} {}", "rule:".dimmed(), diag.rule.dimmed());
        }
        if let Some(suggestion) = &diag.suggestion {
            println!("  {} {}", "help:".cyan(), suggestion);
        }
    }

    let errors = report.diagnostics.len();
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "Found {} {}",
        errors,
        if errors == 1 { "error" } else { "errors" }
    );
}

fn print_metadata(reference: &str, meta: &ActionMetadata) {
    let name = meta.name.as_deref().unwrap_or("(unnamed)");
    println!("{} {}", reference.bold(), name.green());

    let inputs: Vec<String> = meta
        .inputs
        .iter()
        .map(|(input, required)| {
            if *required {
                format!("{input} (required)")
            } else {
                input.clone()
            }
        })
        .collect();
    println!("  {} {}", "inputs:".cyan(), list_or_none(&inputs));

    let outputs: Vec<String> = meta.outputs.iter().cloned().collect();
    println!("  {} {}", "outputs:".cyan(), list_or_none(&outputs));
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn init_command(output: &Path) -> anyhow::Result<bool> {
    let toml_content = toml::to_string_pretty(&CheckConfig::default())?;
    std::fs::write(output, toml_content)?;

    println!(
        "{} Created config file: {}",
        "✓".green().bold(),
        output.display()
    );

    Ok(true)
}
