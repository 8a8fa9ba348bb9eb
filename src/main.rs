use mserver::config::Config;
use mserver::server;
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    // RUST_LOG 优先于配置文件中的日志级别
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting registry server...");
    if let Err(e) = server::start(config).await {
        tracing::error!(error = %e, "Registry server exited with error");
        return Err(e.into());
    }
    Ok(())
}
