use anyhow::Result;
use clap::Parser;
use mydms_api::setup::{self, args::ServerArgs};
use mydms_core::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = ServerArgs::parse();
    let config = AppConfig::from_file(&args.config)?;

    let (_state, router) = setup::initialize_app(&config).await?;

    setup::server::start_server(&args, router).await
}
