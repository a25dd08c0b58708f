mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use metacheck::config::{Config, LogFormat, LoggingConfig};
use metacheck::corpus::{self, CorpusOptions};
use metacheck::extractor::{self, Somef};
use metacheck::output::{self, CorpusFormat, DocumentContext};
use metacheck::record::ExtractionRecord;
use metacheck::rules::{all_rules, find_rule, Indicator};
use metacheck::{analyze, verify, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const EXIT_OK: i32 = 0;
const EXIT_FINDINGS: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn main() {
    let cli = Cli::parse();

    let config = Config::load(config_path(&cli.command)).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(EXIT_ERROR);
    });
    init_logging(&config.logging, cli.verbose);

    let code = match run(cli.command, config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("Error: {e}");
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

fn config_path(command: &Commands) -> Option<&Path> {
    match command {
        Commands::Analyze { config, .. }
        | Commands::Scan { config, .. }
        | Commands::Extract { config, .. }
        | Commands::CheckTools { config } => config.as_deref(),
        Commands::ListRules | Commands::Explain { .. } => None,
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug for this crate, else
/// the configured level.
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("metacheck=debug")
        } else {
            EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"))
        }
    });

    let (writer, ansi) = match &logging.file {
        Some(path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => (BoxMakeWriter::new(std::sync::Mutex::new(file)), false),
            Err(e) => {
                eprintln!("Warning: cannot open log file {}: {e}", path.display());
                (BoxMakeWriter::new(std::io::stderr), true)
            }
        },
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(writer)
        .with_ansi(ansi);
    // A subscriber may already be installed when embedded in tests.
    let _ = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

fn run(command: Commands, mut config: Config) -> Result<i32> {
    match command {
        Commands::Analyze {
            file,
            format,
            output: output_path,
            offline,
            strict,
            config: _,
        } => {
            if offline {
                config.network.enabled = false;
            }
            let record = ExtractionRecord::from_path(&file)?;
            let verifier = verify::from_config(&config.network)?;
            let report = analyze::analyze(&record, &corpus::repository_id(&file), verifier.as_ref());

            let ctx = DocumentContext {
                record: &record,
                created: chrono::Utc::now(),
                default_license: &config.report.default_license,
            };
            let formatted = output::format_report(&report, &format, &ctx)?;
            emit(&formatted, output_path.as_deref())?;

            Ok(strict_exit(strict, report.has_issues()))
        }

        Commands::Scan {
            dir,
            pitfalls_dir,
            summary,
            jobs,
            format,
            offline,
            strict,
            config: _,
        } => {
            if offline {
                config.network.enabled = false;
            }
            if let Some(dir) = pitfalls_dir {
                config.scan.pitfalls_dir = dir;
            }
            if let Some(file) = summary {
                config.scan.summary_file = file;
            }
            if let Some(n) = jobs {
                config.scan.jobs = n;
            }

            let run = scan(&dir, &config)?;
            print!("{}", output::format_corpus(&run, &format)?);
            Ok(strict_exit(strict, run.has_issues()))
        }

        Commands::Extract {
            repo,
            batch,
            out,
            threshold,
            analyze,
            offline,
            config: _,
        } => {
            if offline {
                config.network.enabled = false;
            }
            if let Some(t) = threshold {
                config.extractor.threshold = t;
            }

            let somef = Somef::from_config(&config.extractor);
            if !somef.is_available() {
                eprintln!("Error: {} not found on PATH", somef.command);
                return Ok(EXIT_ERROR);
            }

            if let Some(url) = repo {
                let written = somef.extract_one(&url, &out)?;
                eprintln!("Extraction record written to {}", written.display());
            } else if let Some(list) = batch {
                let repositories = extractor::read_repository_list(&list)?;
                if repositories.is_empty() {
                    eprintln!("Error: no repositories found in {}", list.display());
                    return Ok(EXIT_ERROR);
                }
                let batch_run = somef.extract_batch(&repositories, &out)?;
                eprintln!(
                    "Extracted {} of {} repositories into {}",
                    batch_run.written.len(),
                    repositories.len(),
                    out.display()
                );
            }

            if analyze {
                let run = scan(&out, &config)?;
                print!("{}", output::format_corpus(&run, &CorpusFormat::Pretty)?);
            }
            Ok(EXIT_OK)
        }

        Commands::ListRules => {
            println!("{}", "Pitfall Catalogue".bold().underline());
            for indicator in [Indicator::Codemeta, Indicator::MetadataFile, Indicator::License] {
                println!();
                println!("  {}", indicator.as_str().bold());
                for rule in all_rules().iter().filter(|r| r.indicator == indicator) {
                    println!(
                        "    [{severity}] {code}  {description}",
                        severity = severity_label(rule.severity),
                        code = rule.code,
                        description = rule.description,
                    );
                }
            }
            println!();
            println!("  Total: {} rules", all_rules().len());
            Ok(EXIT_OK)
        }

        Commands::Explain { code } => match find_rule(&code) {
            Some(rule) => {
                println!("{}", rule.code.bold());
                println!();
                println!("  Severity:     {}", rule.severity);
                println!("  Indicator:    {}", rule.indicator.iri());
                println!("  Description:  {}", rule.description);
                println!("  Suggestion:   {}", rule.suggestion);
                Ok(EXIT_OK)
            }
            None => {
                eprintln!("Unknown rule: {code}");
                eprintln!("Use 'metacheck list-rules' to see all available rules.");
                Ok(EXIT_ERROR)
            }
        },

        Commands::CheckTools { config: _ } => {
            println!("{}", "Tool Availability".bold().underline());
            println!();

            let somef = Somef::from_config(&config.extractor);
            let extractor_status = if somef.is_available() {
                "READY".green().bold().to_string()
            } else {
                "NOT AVAILABLE".red().to_string()
            };
            println!(
                "  [{extractor_status}] {:<20} metadata extraction (threshold {})",
                somef.command, somef.threshold
            );

            let network_status = if config.network.enabled {
                "ENABLED".green().bold().to_string()
            } else {
                "DISABLED".yellow().to_string()
            };
            println!(
                "  [{network_status}] {:<20} URL verification (timeout {}s)",
                "network", config.network.timeout_secs
            );

            println!();
            println!("Note: analyze and scan need no external tools; extract needs the extractor.");
            Ok(EXIT_OK)
        }
    }
}

fn scan(dir: &Path, config: &Config) -> Result<corpus::CorpusRun> {
    let verifier = verify::from_config(&config.network)?;
    let options = CorpusOptions::from_config(config);
    corpus::run_corpus(dir, &options, verifier.as_ref())
}

fn emit(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, text).map_err(|e| metacheck::Error::Io {
                path: PathBuf::from(p),
                source: e,
            })?;
            eprintln!("Output written to {}", p.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn strict_exit(strict: bool, has_issues: bool) -> i32 {
    if strict && has_issues {
        EXIT_FINDINGS
    } else {
        EXIT_OK
    }
}

fn severity_label(severity: metacheck::finding::Severity) -> String {
    match severity {
        metacheck::finding::Severity::Pitfall => "PITFALL".red().bold().to_string(),
        metacheck::finding::Severity::Warning => "   WARN".yellow().bold().to_string(),
    }
}
