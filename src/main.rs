// src/main.rs

use std::path::Path;

use bundlewatch::config::load_and_validate;
use bundlewatch::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("bundlewatch error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    // Config first: its `debug` flag feeds the log level.
    let cfg = load_and_validate(Path::new(&args.config))?;
    logging::init_logging(args.log_level, cfg.global().debug)?;
    run(args, cfg).await?;
    Ok(())
}
