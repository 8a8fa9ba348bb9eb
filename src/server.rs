use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::{Config, ConfigError};
use crate::services::api;
use crate::services::registry::{MemoryStore, RegistryService, SystemClock};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

// 使用内存存储与系统时钟构建注册中心服务
pub fn build_service(config: &Config) -> RegistryService {
    RegistryService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(SystemClock),
        config.registry_settings(),
    )
}

pub async fn start(config: Config) -> Result<(), ServerError> {
    let addr = config.listen_addr()?;
    let service = build_service(&config);

    // 启动可选的后台清理任务
    let task_tracker = TaskTracker::new();
    let shutdown = CancellationToken::new();
    if let Some(sweep_interval) = config.sweep_interval() {
        tracing::info!(
            sweep_interval_secs = sweep_interval.as_secs(),
            "Starting background sweep task"
        );
        service.start_sweep_task(sweep_interval, &task_tracker, shutdown.clone());
    }
    task_tracker.close();

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(
        address = %addr,
        heartbeat_timeout_secs = config.registry.heartbeat_timeout,
        require_signature = config.registry.require_signature,
        "Registry server listening"
    );

    let app = api::router(service);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    shutdown.cancel();
    task_tracker.wait().await;
    tracing::info!("Registry server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // 无法监听信号时保持运行
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
