use clap::{ArgGroup, Parser, Subcommand};
use metacheck::output::{CorpusFormat, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "metacheck",
    version,
    about = "Metadata pitfall detection for research software repositories"
)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze one extraction record
    Analyze {
        /// Path to a SoMEF JSON output file
        file: PathBuf,

        /// Output format
        #[arg(long, short, default_value = "pretty", value_enum)]
        format: OutputFormat,

        /// Write output to file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Skip HTTP verification of URLs
        #[arg(long)]
        offline: bool,

        /// Exit with status 1 when any pitfall or warning is found
        #[arg(long)]
        strict: bool,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Analyze every extraction record in a directory
    Scan {
        /// Directory containing SoMEF JSON output files
        dir: PathBuf,

        /// Directory for per-repository JSON-LD documents
        #[arg(long)]
        pitfalls_dir: Option<PathBuf>,

        /// Path of the corpus summary file
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Worker threads (0 = one per CPU)
        #[arg(long, short)]
        jobs: Option<usize>,

        /// Output format for the printed summary
        #[arg(long, short, default_value = "pretty", value_enum)]
        format: CorpusFormat,

        /// Skip HTTP verification of URLs
        #[arg(long)]
        offline: bool,

        /// Exit with status 1 when any repository has findings
        #[arg(long)]
        strict: bool,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the extraction tool on one or more repositories
    #[command(group(ArgGroup::new("source").required(true).args(["repo", "batch"])))]
    Extract {
        /// Repository URL
        #[arg(long)]
        repo: Option<String>,

        /// JSON file of the form {"repositories": [...]}
        #[arg(long)]
        batch: Option<PathBuf>,

        /// Directory for extraction records
        #[arg(long, default_value = "somef_outputs")]
        out: PathBuf,

        /// Confidence threshold passed to the extraction tool
        #[arg(long)]
        threshold: Option<f64>,

        /// Scan the output directory afterwards
        #[arg(long)]
        analyze: bool,

        /// Skip HTTP verification of URLs during the scan
        #[arg(long)]
        offline: bool,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List all rules grouped by quality indicator
    ListRules,

    /// Show full explanation for a rule
    Explain {
        /// Rule code (e.g., "P008")
        code: String,
    },

    /// Check which external tools are available
    CheckTools {
        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
