//! Coordinator Binary
//!
//! Runs the rollout-coordination HTTP server that batches scored
//! trajectory groups for a GRPO trainer.

use atropos_coordinator::config::Config;
use atropos_coordinator::coordinator::Server;
use clap::Parser;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Config::parse();
    atropos_coordinator::init(config.log_level());
    Server::run(config.port).await
}
