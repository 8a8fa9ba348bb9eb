use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::service::RegistryService;

impl RegistryService {
    // 启动后台清理任务，与请求路径上的惰性清理并存
    pub fn start_sweep_task(
        &self,
        sweep_interval: Duration,
        task_tracker: &TaskTracker,
        shutdown: CancellationToken,
    ) {
        let service = self.clone();

        task_tracker.spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Sweep task stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::debug!("Executing server expiration check...");
                        if let Err(e) = service.prune().await {
                            tracing::error!(error = %e, "Background sweep failed");
                        }
                    }
                }
            }
        });
    }
}
