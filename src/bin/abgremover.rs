//! ABG Remover CLI tool
//!
//! Command-line interface for batch background removal using the abgremover
//! library's worker/controller core.

#[cfg(feature = "cli")]
use abgremover::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
