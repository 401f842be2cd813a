use accesswatch::analysis::TrafficSummary;
use accesswatch::config::{AccesswatchConfig, LogFormat, LoggingConfig};
use accesswatch::ingest::InputEncoding;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "accesswatch",
    about = "Web-server access log parser and anomaly detector",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (defaults: $ACCESSWATCH_CONFIG, ./accesswatch.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, enrich and scan a log; write processed.csv and findings.csv
    Analyze {
        /// Path to the Apache/Nginx access log
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Directory where CSV files are saved
        #[arg(long, short = 'o')]
        outdir: Option<PathBuf>,

        /// Minimum number of 401/403 errors in one window to report a burst
        #[arg(long)]
        error_threshold: Option<usize>,

        /// Burst window size in minutes
        #[arg(long)]
        window_minutes: Option<u32>,

        /// Sensitive path fragment (repeatable; replaces the built-in list)
        #[arg(long = "sensitive-path", value_name = "FRAGMENT")]
        sensitive_paths: Vec<String>,

        /// Input text encoding
        #[arg(long, value_enum)]
        encoding: Option<InputEncoding>,

        /// Also print findings as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print overall traffic statistics for a log
    Summary {
        /// Path to the Apache/Nginx access log
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Number of most active IPs to list
        #[arg(long)]
        top: Option<usize>,

        /// Input text encoding
        #[arg(long, value_enum)]
        encoding: Option<InputEncoding>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AccesswatchConfig::load(path)?,
        None => AccesswatchConfig::load_or_default(),
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Analyze {
            input,
            outdir,
            error_threshold,
            window_minutes,
            sensitive_paths,
            encoding,
            json,
        } => {
            let mut options = config.detection.clone();
            if let Some(threshold) = error_threshold {
                options.error_threshold = threshold;
            }
            if let Some(minutes) = window_minutes {
                options.window_minutes = minutes;
            }
            if !sensitive_paths.is_empty() {
                options.sensitive_paths = Some(sensitive_paths);
            }
            let encoding = encoding.unwrap_or(config.input.encoding);
            let outdir = outdir.unwrap_or_else(|| config.output.outdir.clone());

            tracing::info!(
                input = %input.display(),
                error_threshold = options.error_threshold,
                window_minutes = options.window_minutes,
                "Running analysis"
            );
            let output = accesswatch::analyze_file(&input, encoding, &options)?;
            let paths = accesswatch::export::save_outputs(&outdir, &output)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&output.findings)?);
            } else {
                println!("{} valid lines read.", output.records.len());
                println!("Processed data saved to {}", paths.records.display());
                println!("Detected anomalies saved to {}", paths.findings.display());
                if output.findings.is_empty() {
                    println!("No anomalies detected with current rules.");
                } else {
                    println!();
                    println!("{:<25} | {:<15} | {:<14} | {:>5} | Path", "Timestamp", "IP", "Signal", "Score");
                    println!("{:-<25}-|-{:-<15}-|-{:-<14}-|-{:->5}-|-{:-<30}", "", "", "", "", "");
                    for finding in &output.findings {
                        let ts = finding
                            .timestamp
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "-".to_string());
                        println!(
                            "{:<25} | {:<15} | {:<14} | {:>5} | {}",
                            ts, finding.ip, finding.signal, finding.score, finding.path
                        );
                    }
                }
            }
        }
        Commands::Summary {
            input,
            top,
            encoding,
            json,
        } => {
            let encoding = encoding.unwrap_or(config.input.encoding);
            let top = top.unwrap_or(config.output.top_ips);

            let records = accesswatch::enrich::enrich(accesswatch::ingest::read_log_file(&input, encoding)?);
            let summary = TrafficSummary::from_records(&records, top);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("\n=== Overall statistics ===");
                println!("Number of requests: {}", summary.total_requests);
                println!("Unique IPs:         {}", summary.unique_ips);
                println!("Error rate (>=400): {:.2}%", summary.error_rate_pct);

                println!("\n=== Requests per hour ===");
                for (hour, count) in &summary.requests_per_hour {
                    println!("{:02}:00  {}", hour, count);
                }

                println!("\n=== Status categories ===");
                for (category, count) in &summary.status_categories {
                    println!("{}xx    {}", category, count);
                }

                println!("\n=== Top {} most active IPs ===", top);
                println!("{:<39} | Requests", "IP");
                println!("{:-<39}-|-{:-<8}", "", "");
                for entry in &summary.top_ips {
                    println!("{:<39} | {}", entry.ip, entry.requests);
                }
                println!();
            }
        }
    }

    Ok(())
}
