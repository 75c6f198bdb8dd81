use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use wrap_snake::game::GameConfig;
use wrap_snake::logging;
use wrap_snake::modes::HumanMode;

#[derive(Parser)]
#[command(name = "wrap_snake")]
#[command(version, about = "Snake on a wrap-around grid that speeds up as it grows")]
struct Cli {
    /// Grid width (at least 10)
    #[arg(long, default_value = "50")]
    width: usize,

    /// Grid height (at least 10)
    #[arg(long, default_value = "25")]
    height: usize,

    /// Initial snake length
    #[arg(long, default_value = "5")]
    length: usize,

    /// Starting tick interval in milliseconds
    #[arg(long, default_value = "400")]
    tick_ms: u64,

    /// Seed for target placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            initial_tick_ms: self.tick_ms,
            seed: self.seed,
            ..GameConfig::new(self.width, self.height, self.length)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_tracing(cli.log_file.as_deref())?;
    logging::install_panic_hook();

    let config = cli.game_config();
    tracing::info!(?config, "starting");

    let mut human_mode = HumanMode::new(config)?;
    human_mode.run().await?;

    Ok(())
}
