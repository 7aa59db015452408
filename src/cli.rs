use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the feed once and print the display payload as JSON.
    Snapshot(SnapshotArgs),
    /// Analyze a saved feed file without touching the network.
    Inspect(InspectArgs),
}

#[derive(Debug, Clone, Args)]
pub struct FeedArgs {
    /// Goodreads updates RSS URL (must be http/https).
    #[arg(long, env = "GOODREADS_RSS_URL")]
    pub feed_url: Option<String>,

    /// Goodreads numeric user id, enables the profile page challenge lookup.
    #[arg(long, env = "GOODREADS_USER_ID")]
    pub user_id: Option<String>,

    /// Base URL of the profile pages.
    #[arg(long, default_value = "https://www.goodreads.com")]
    pub profile_base_url: String,

    /// Annual challenge goal to pair with bare "X books read" counts.
    #[arg(long, env = "GOODREADS_CHALLENGE_GOAL")]
    pub challenge_goal: Option<u32>,

    /// Lifetime of the cached current-book record.
    #[arg(long, default_value_t = 300)]
    pub book_ttl_secs: u64,

    /// Lifetime of the cached challenge record.
    #[arg(long, default_value_t = 1800)]
    pub challenge_ttl_secs: u64,

    /// Number of most recent feed entries considered for fusion.
    #[arg(long, default_value_t = 20)]
    pub entry_window: usize,

    /// Upstream request timeout.
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Saved RSS feed file.
    #[arg(long)]
    pub input: String,

    /// Number of most recent feed entries considered for fusion.
    #[arg(long, default_value_t = 20)]
    pub entry_window: usize,

    /// Annual challenge goal to pair with bare "X books read" counts.
    #[arg(long)]
    pub challenge_goal: Option<u32>,
}
