use std::sync::Arc;

use clap::Parser;
use docsource::config::{self, AppState};
use docsource::{logger, server};

/// Read-only document retrieval service
#[derive(Parser, Debug)]
#[command(name = "docsource")]
#[command(version)]
struct Cli {
    /// Config file, with or without the `.toml` extension
    #[arg(short, long, default_value = "config")]
    config: String,
}

impl Cli {
    /// Config path without extension, as the `config` crate expects
    fn config_path(&self) -> &str {
        self.config.strip_suffix(".toml").unwrap_or(&self.config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::Config::load_from(cli.config_path())?;
    logger::init(&cfg.logging)?;

    // Tokio runtime, sized by server.workers when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr, cfg.server.backlog)?;

    let datasource = config::build_data_source(&cfg);
    logger::log_server_start(&addr, &cfg);
    let state = Arc::new(AppState::new(cfg, datasource));

    server::start_server_loop(listener, state, server::shutdown_signal()).await?;
    Ok(())
}
