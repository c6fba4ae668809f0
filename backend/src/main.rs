//! Layoffs CLI - clean raw layoff CSV exports
//!
//! # Main Commands
//!
//! ```bash
//! layoffs clean layoffs.csv -o clean.csv   # Run the full cleaning pipeline
//! layoffs report clean.json                # Aggregate reports over cleaned rows
//! layoffs serve                            # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! layoffs parse layoffs.csv                # Ingest only, raw rows as JSON
//! layoffs validate-config rules.json       # Check a cleaning configuration
//! layoffs example-config                   # Print the built-in configuration
//! ```
//!
//! The configuration defaults to `$LAYOFFS_CONFIG` (also read from `.env`)
//! when `--config` is not given.

use clap::{Parser, Subcommand};
use layoffs::{
    clean_file, export, parse_file, report, validate_cleaning_config, CleaningConfig, Dimension,
    ExportFormat, Report, RowCollection,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "layoffs")]
#[command(about = "Clean raw layoff CSV exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full cleaning pipeline: ingest → dedup → normalize → backfill → prune → coerce
    Clean {
        /// Input CSV file
        input: PathBuf,

        /// Cleaning configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Also write the aggregate report (JSON) to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Companies kept per year in the report ranking
        #[arg(long, default_value_t = report::DEFAULT_TOP_N)]
        top_n: usize,
    },

    /// Parse a CSV file and output the raw rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Cleaning configuration (only null markers are used)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate reports over cleaned rows (JSON from `clean --format json`)
    Report {
        /// Input JSON file (array of rows)
        input: PathBuf,

        /// Only output totals grouped by this dimension
        #[arg(long, value_enum)]
        by: Option<Dimension>,

        /// Companies kept per year in the ranking
        #[arg(long, default_value_t = report::DEFAULT_TOP_N)]
        top_n: usize,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a cleaning configuration file
    ValidateConfig {
        /// Configuration JSON file
        input: PathBuf,
    },

    /// Show the built-in cleaning configuration
    ExampleConfig,

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean {
            input,
            config,
            delimiter,
            output,
            format,
            report,
            top_n,
        } => cmd_clean(
            &input,
            config.as_deref(),
            delimiter,
            output.as_deref(),
            format,
            report.as_deref(),
            top_n,
        ),

        Commands::Parse {
            input,
            config,
            delimiter,
            output,
        } => cmd_parse(&input, config.as_deref(), delimiter, output.as_deref()),

        Commands::Report {
            input,
            by,
            top_n,
            output,
        } => cmd_report(&input, by, top_n, output.as_deref()),

        Commands::ValidateConfig { input } => cmd_validate_config(&input),

        Commands::ExampleConfig => cmd_example_config(),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_clean(
    input: &Path,
    config_path: Option<&Path>,
    delimiter: Option<char>,
    output: Option<&Path>,
    format: ExportFormat,
    report_path: Option<&Path>,
    top_n: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = CleaningConfig::resolve(config_path)?;
    let result = clean_file(input, delimiter, &config)?;

    eprintln!("\n📊 SUMMARY");
    eprintln!("   Raw rows:    {}", result.raw_count());
    for stage in &result.stages {
        eprintln!("   {}", stage.summary());
    }
    eprintln!("   Clean rows:  {}", result.rows.len());

    let warnings = result.warnings();
    if !warnings.is_empty() {
        eprintln!("\n⚠️  {} warning(s):", warnings.len());
        for warning in warnings.iter().take(10) {
            eprintln!("   - {}", warning);
        }
    }

    if let Some(path) = report_path {
        let report = Report::build(&result.rows, top_n);
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        eprintln!("   💾 Report saved to: {}", path.display());
    }

    let content = export(&result.rows, format)?;
    write_output(&content, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_parse(
    input: &Path,
    config_path: Option<&Path>,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let config = CleaningConfig::resolve(config_path)?;
    let source = parse_file(input, delimiter, &config)?;
    let info = source.info();

    eprintln!("   Encoding: {}", info.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        layoffs::clean::format_delimiter(info.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", info.headers.join(", "));
    eprintln!("✅ Parsed {} rows", source.len());

    let json = serde_json::to_string_pretty(source.rows())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_report(
    input: &Path,
    by: Option<Dimension>,
    top_n: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📊 Reporting: {}", input.display());

    let content = fs::read_to_string(input)?;
    let rows: RowCollection = serde_json::from_str(&content)?;
    eprintln!("   {} rows", rows.len());

    let json = match by {
        Some(dimension) => serde_json::to_string_pretty(&report::totals_by(&rows, dimension))?,
        None => serde_json::to_string_pretty(&Report::build(&rows, top_n))?,
    };
    write_output(&json, output)?;

    Ok(())
}

fn cmd_validate_config(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let content = fs::read_to_string(input)?;
    let value: Value = serde_json::from_str(&content)?;

    if let Err(errors) = validate_cleaning_config(&value) {
        eprintln!("\n❌ {} schema violation(s):", errors.len());
        for err in &errors {
            eprintln!("   - {}", err);
        }
        std::process::exit(1);
    }

    CleaningConfig::from_value(&value)?;
    eprintln!("✅ Configuration is valid");
    Ok(())
}

fn cmd_example_config() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", CleaningConfig::default().to_json()?);
    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    layoffs::server::start_server(port).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
