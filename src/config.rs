use clap::Parser;

const DEFAULT_PORT: u16 = 8000;

/// Rollout-coordination server for RLAIF training.
#[derive(Debug, Parser)]
#[command(name = "coordinator", version, about)]
pub struct Config {
    /// Port to bind the HTTP server to.
    #[arg(long, env = "ATROPOS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
