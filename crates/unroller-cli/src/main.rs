//! `content-unroller` binary.

use clap::Parser;
use unroller_cli::{CliArgs, UnrollerCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let cli = UnrollerCli::from_args("content-unroller", &args)?;
    cli.run(args).await?;
    Ok(())
}
