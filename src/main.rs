use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};
use trend_crew::cli::{Args, Command};
use trend_crew::generator::workflow::launch;
use trend_crew::server;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let log_filter_handle = init_tracing(args.verbose);

    let command = args.command();
    let config = args.into_config()?;
    // 配置文件里的 verbose 在解析后才知道
    if config.verbose {
        log_filter_handle.reload(log_filter(true))?;
    }

    match command {
        Command::Serve { .. } => server::serve(&config).await,
        Command::Run {
            topic, subtopics, ..
        } => {
            let (artifact, path) = launch(&config, &topic, &subtopics).await?;
            println!("{}", artifact.text);
            eprintln!("💾 report saved to {}", path.display());
            Ok(())
        }
    }
}

/// 初始化日志，返回的句柄用于在配置加载后调整级别
fn init_tracing(verbose: bool) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(log_filter(verbose));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    handle
}

/// `RUST_LOG` 优先
fn log_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trend_crew={level},tower_http={level}")))
}
