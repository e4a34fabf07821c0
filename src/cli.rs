use clap::{Parser, Subcommand};

// Display order for API key option (placed at top of help text)
const API_KEY_DISPLAY_ORDER: usize = 0;
// Display order for log level option (placed at end of help text)
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

/// CLI arguments
#[derive(Parser)]
#[command(name = "lintmend", version, about = "Fix static analysis violations with an LLM", long_about = None)]
pub struct Cli {
    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: LINTMEND_LOG=] [default: info]
    #[arg(
        long,
        env = "LINTMEND_LOG",
        default_value = "info",
        global = true,
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a default lintmend.toml config file
    Init(InitArgs),
    /// Run the analyzer on a file and summarize its violations
    Check(CheckArgs),
    /// Fix the violations reported for a file and write a corrected copy
    Fix(FixArgs),
}

/// Arguments for the init command
#[derive(Parser)]
pub struct InitArgs {
    /// Path to config file
    #[arg(long, default_value = "lintmend.toml")]
    pub config: String,

    /// Override existing config file
    #[arg(long)]
    pub r#override: bool,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Source file to analyze
    pub input: String,

    /// Analyzer to run
    #[arg(long, default_value = "pmd")]
    pub tool: String,

    /// Path to config file (initialize with `lintmend init`)
    #[arg(long, default_value = "lintmend.toml")]
    pub config: String,

    /// Override config values using dot notation (e.g. analyzer.pmd.timeout_secs=60)
    #[arg(long = "config-override")]
    pub config_overrides: Vec<String>,

    /// Output file path for the violations (.md or .json)
    #[arg(long)]
    pub output: Option<String>,
}

/// Arguments for the fix command
#[derive(Parser, Debug)]
pub struct FixArgs {
    /// Source file to fix
    pub input: String,

    /// Analyzer to run
    #[arg(long, default_value = "pmd")]
    pub tool: String,

    /// Path to config file (initialize with `lintmend init`)
    #[arg(long, default_value = "lintmend.toml")]
    pub config: String,

    /// Override config values using dot notation (e.g. llm.model=gpt-4)
    #[arg(long = "config-override")]
    pub config_overrides: Vec<String>,

    /// LLM API key
    #[arg(long, env = "LINTMEND_LLM_API_KEY", display_order = API_KEY_DISPLAY_ORDER)]
    pub api_key: String,

    /// Output file path [default: <input>.fixed.<ext> next to the input]
    #[arg(long)]
    pub output: Option<String>,

    /// Trace file path to record instructions and responses per rule (.md or .json)
    #[arg(long)]
    pub trace: Option<String>,

    /// Skip re-running the analyzer on the fixed file
    #[arg(long)]
    pub no_verify: bool,
}
