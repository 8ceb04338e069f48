use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use pipeline::config::{
    DEFAULT_AUDIT_PATH, DEFAULT_CLEAN_PATH, DEFAULT_FINAL_PATH, DEFAULT_OUTPUT_PATH,
    DEFAULT_RAW_PATH, DEFAULT_REQUEST_DELAY,
};
use pipeline::{AuditConfig, CleanConfig, RecoveryConfig, RecoverySummary};
use sources::letterboxd::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use sources::{LetterboxdConfig, LetterboxdSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// cinema-recover - Asian cinema ratings toolkit
#[derive(Parser)]
#[command(name = "cinema-recover")]
#[command(about = "Audit, clean, validate and recover missing Letterboxd ratings", long_about = None)]
struct Cli {
    /// Defaults to `recover` with the standard data/ paths
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Recover missing ratings from Letterboxd with a median fallback
    Recover(RecoverArgs),

    /// Build the audit list of records missing a rating
    Audit {
        /// Clean dataset
        #[arg(long, default_value = DEFAULT_CLEAN_PATH)]
        clean: PathBuf,

        /// Curated dataset; created from the clean one when absent
        #[arg(long = "final", default_value = DEFAULT_FINAL_PATH)]
        final_path: PathBuf,

        /// Where to write the audit list
        #[arg(long, default_value = DEFAULT_AUDIT_PATH)]
        audit: PathBuf,
    },

    /// Print a data-quality report for a dataset file
    Validate {
        /// Dataset to check
        #[arg(default_value = DEFAULT_CLEAN_PATH)]
        path: PathBuf,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clean the raw collector export
    Clean {
        /// Raw collector CSV
        #[arg(long, default_value = DEFAULT_RAW_PATH)]
        input: PathBuf,

        /// Where to write the clean dataset
        #[arg(long, default_value = DEFAULT_CLEAN_PATH)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct RecoverArgs {
    /// Audit list of records to recover
    #[arg(long, default_value = DEFAULT_AUDIT_PATH)]
    audit: PathBuf,

    /// Clean dataset to backfill
    #[arg(long, default_value = DEFAULT_CLEAN_PATH)]
    clean: PathBuf,

    /// Output path; must differ from the inputs
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Pause between lookups, in milliseconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY.as_millis() as u64)]
    delay_ms: u64,

    /// Omit the lb_rating_source column to keep the original schema
    #[arg(long)]
    drop_provenance: bool,

    /// Letterboxd base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

impl Default for RecoverArgs {
    fn default() -> Self {
        Self {
            audit: PathBuf::from(DEFAULT_AUDIT_PATH),
            clean: PathBuf::from(DEFAULT_CLEAN_PATH),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            delay_ms: DEFAULT_REQUEST_DELAY.as_millis() as u64,
            drop_provenance: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Dispatch to appropriate command handler
    match cli.command.unwrap_or_else(|| Commands::Recover(RecoverArgs::default())) {
        Commands::Recover(args) => handle_recover(args).await?,
        Commands::Audit {
            clean,
            final_path,
            audit,
        } => handle_audit(clean, final_path, audit)?,
        Commands::Validate { path, json } => handle_validate(path, json)?,
        Commands::Clean { input, output } => handle_clean(input, output)?,
    }

    Ok(())
}

/// Handle the 'recover' command
async fn handle_recover(args: RecoverArgs) -> Result<()> {
    let config = RecoveryConfig {
        audit_path: args.audit,
        clean_path: args.clean,
        output_path: args.output,
        request_delay: Duration::from_millis(args.delay_ms),
        keep_provenance: !args.drop_provenance,
    };
    let source = LetterboxdSource::new(LetterboxdConfig {
        base_url: args.base_url,
        timeout: Duration::from_secs(args.timeout_secs),
        ..LetterboxdConfig::default()
    })
    .context("Failed to build Letterboxd client")?;

    let start = Instant::now();
    let summary = pipeline::run_recovery(&config, Arc::new(source)).await?;
    print_recovery_summary(&summary);
    println!("{} Finished in {:?}", "✓".green(), start.elapsed());
    Ok(())
}

/// Handle the 'audit' command
fn handle_audit(clean: PathBuf, final_path: PathBuf, audit: PathBuf) -> Result<()> {
    let config = AuditConfig {
        clean_path: clean,
        final_path,
        audit_path: audit,
    };
    let summary = pipeline::run_audit(&config)?;

    if summary.created_final {
        println!(
            "{} Created {} ({} rows)",
            "✓".green(),
            config.final_path.display(),
            summary.final_rows
        );
    }
    println!(
        "{} Audit file created at {}",
        "✓".green(),
        config.audit_path.display()
    );
    println!("Total movies in backlog: {}", summary.backlog.to_string().bold());
    Ok(())
}

/// Handle the 'validate' command
fn handle_validate(path: PathBuf, json: bool) -> Result<()> {
    let report = data_loader::validate_file(&path)
        .with_context(|| format!("Failed to validate {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for line in report.to_string().lines() {
        if line.starts_with("PASS") || line.starts_with("ok") {
            println!("{}", line.green());
        } else if line.starts_with("FAIL") {
            println!("{}", line.red());
        } else if line.starts_with("SKIP") || line.starts_with("warn") {
            println!("{}", line.yellow());
        } else {
            println!("{}", line);
        }
    }
    println!("\n--- Verification Complete ---");
    Ok(())
}

/// Handle the 'clean' command
fn handle_clean(input: PathBuf, output: PathBuf) -> Result<()> {
    let config = CleanConfig {
        raw_path: input,
        output_path: output,
    };
    let summary = pipeline::run_clean(&config)?;
    print!("{}", summary);
    println!(
        "\n{} Cleaned data saved to {}",
        "✓".green(),
        config.output_path.display()
    );
    Ok(())
}

fn print_recovery_summary(summary: &RecoverySummary) {
    println!("{}", "Recovery complete!".bold().blue());
    println!("{}Audited entries: {}", "• ".green(), summary.audited);
    println!("{}Fetched from Letterboxd: {}", "• ".green(), summary.fetched);
    println!("{}Median fallback: {}", "• ".green(), summary.median);
    println!("{}Rows updated: {}", "• ".cyan(), summary.merge.filled());
    if summary.merge.still_missing > 0 {
        println!(
            "{}",
            format!(
                "• {} rows still have no rating (never audited)",
                summary.merge.still_missing
            )
            .yellow()
        );
    }
    if summary.merge.unknown_ids > 0 || summary.merge.duplicate_ids > 0 {
        println!(
            "{}",
            format!(
                "• Ignored {} unknown and {} duplicate audit ids",
                summary.merge.unknown_ids, summary.merge.duplicate_ids
            )
            .yellow()
        );
    }
    println!("Saved to {}", summary.output_path.display());
}
