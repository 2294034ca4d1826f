//! Command line arguments of the server

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "mydms-api", about = "mydms document management backend")]
pub struct ServerArgs {
    /// Interface to listen on
    #[arg(long, default_value = "localhost")]
    pub hostname: String,
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
    /// Path of the JSON configuration file
    #[arg(short = 'c', long = "config", default_value = "application.json")]
    pub config: PathBuf,
}

impl ServerArgs {
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
