use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "erplab",
    version,
    about = "Event-related potential (ERP) preprocessing command-line tool",
    long_about = "Load EEG recordings (EDF), band-pass filter, re-reference, extract\n\
                  stimulus events, build baseline-corrected epochs and plot evoked\n\
                  responses. Without --file, a bundled sample recording is used\n\
                  (location override: $ERP_SAMPLE_PATH)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full preprocessing demo pipeline
    Demo(DemoArgs),
    /// Show recording header information
    Info(InfoArgs),
    /// Extract events from a stim channel
    Events(EventsArgs),
    /// Validate a data file
    Validate(ValidateArgs),
}

#[derive(Args)]
#[command(allow_negative_numbers = true)]
pub struct DemoArgs {
    /// Input EDF file (default: the bundled sample recording)
    #[arg(long)]
    pub file: Option<String>,

    /// Band-pass low cutoff in Hz
    #[arg(long, default_value_t = 1.0)]
    pub low: f64,

    /// Band-pass high cutoff in Hz
    #[arg(long, default_value_t = 40.0)]
    pub high: f64,

    /// Butterworth filter order
    #[arg(long, default_value_t = 4)]
    pub order: usize,

    /// Stim channel carrying the trigger codes
    #[arg(long, default_value = "STI 014")]
    pub stim_channel: String,

    /// Epoch start relative to the event, in seconds
    #[arg(long, default_value_t = -0.2)]
    pub tmin: f64,

    /// Epoch end relative to the event, in seconds
    #[arg(long, default_value_t = 0.5)]
    pub tmax: f64,

    /// Condition label to average ("auditory" matches both sides)
    #[arg(long, default_value = "auditory/left")]
    pub label: String,

    /// Output path for the evoked butterfly plot (PNG)
    #[arg(long, default_value = "evoked.png")]
    pub plot: String,

    /// Write the evoked record as JSON to this file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Input EDF file (default: the bundled sample recording)
    #[arg(long)]
    pub file: Option<String>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct EventsArgs {
    /// Input EDF file (default: the bundled sample recording)
    #[arg(long)]
    pub file: Option<String>,

    /// Stim channel carrying the trigger codes
    #[arg(long, default_value = "STI 014")]
    pub stim_channel: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Input data file path
    #[arg(long)]
    pub file: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
