use clap::Parser;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;

/// Download Garmin Connect activities as FIT files.
#[derive(Debug, Clone, Parser)]
#[command(name = "garmin-fit-exporter", version, about)]
pub struct Cli {
    /// Directory where FIT files will be written (created if missing)
    #[arg(long, default_value = "./activities")]
    pub output: PathBuf,

    /// Garmin username. Defaults to $GARMIN_USERNAME or an interactive prompt
    #[arg(long)]
    pub username: Option<String>,

    /// Garmin password. Defaults to $GARMIN_PASSWORD or a hidden prompt
    #[arg(long)]
    pub password: Option<String>,

    /// Number of activities fetched per listing request
    #[arg(long, default_value = "100")]
    pub batch_size: NonZeroU32,

    /// Stop listing after this many activities (defaults to every activity)
    #[arg(long)]
    pub max_activities: Option<NonZeroUsize>,

    /// Skip downloads when the destination FIT file already exists
    #[arg(long)]
    pub skip_existing: bool,
}
