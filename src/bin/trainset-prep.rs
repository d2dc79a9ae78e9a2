//! Training-set preparation CLI tool
//!
//! Command-line interface for the trainset-prep download and resize
//! pipelines.

use trainset_prep::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
