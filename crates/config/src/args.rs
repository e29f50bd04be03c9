use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to .env file (e.g., .env.moonbeam)
    #[arg(short, long, default_value = ".env")]
    pub env_file: String,

    /// First block of a historical range. Without it the monitor follows the chain head.
    #[arg(long)]
    pub from: Option<u64>,

    /// Last block of the range (inclusive). Defaults to --from.
    #[arg(long, requires = "from")]
    pub to: Option<u64>,

    /// Follow finalized heads instead of best heads
    #[arg(long, conflicts_with = "from")]
    pub finalized: bool,

    /// Number of blocks fetched in parallel during a range walk
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Text printed before every block line
    #[arg(long)]
    pub prefix: Option<String>,

    /// Disable colors in the block lines
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Inclusive block range requested on the command line, if any
    pub fn range(&self) -> Option<(u64, u64)> {
        self.from.map(|from| (from, self.to.unwrap_or(from)))
    }
}
