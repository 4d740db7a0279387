use anyhow::Result;
use clap::Parser;
use deep_research_rs::{cli, launch, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let documents = args.load_documents()?;
    let config = args.into_config()?;
    logging::init(config.verbose);

    launch(&config, documents).await
}
