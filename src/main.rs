mod app;
mod config;
mod db;
mod error;
mod models;
mod parser;
mod services;
mod source;
mod sync;

use app::{App, Command};
use config::Config;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", app::USAGE);
            std::process::exit(2);
        }
    };

    // Load configuration
    let config = Config::load()?;

    let mut app = App::new(config).await?;
    app.run(command).await
}
