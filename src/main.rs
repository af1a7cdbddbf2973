use std::sync::{Arc, Mutex};

use clap::Parser;
use ssf_sim::cli::CliOpts;
use ssf_sim::{api, engine};
use tracing::{info, Level};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;

fn print_essentials(opts: &CliOpts, config: &engine::Config) {
  info!("Starting SSF/LMD-GHOST research simulator");
  info!("Version: {}", env!("CARGO_PKG_VERSION"));
  info!("Listening on: {}", opts.socket_addr());
  info!("Validators: {}", config.num_validators);
  info!("Seed: {}", config.random_seed);
  info!("Quorum: {} of {}", config.quorum(), config.num_validators);
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
  let opts = CliOpts::parse();

  let loglevel = match opts.verbose {
    1 => Level::DEBUG,
    2.. => Level::TRACE,
    _ => Level::INFO,
  };
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::fmt::layer()
        .with_filter(filter_fn(move |metadata| metadata.level() <= &loglevel)),
    )
    .init();

  let config = opts.engine_config();
  print_essentials(&opts, &config);

  let engine = engine::Engine::new(config)?;
  let shared = Arc::new(Mutex::new(engine));

  api::serve(shared, opts.socket_addr()).await
}
