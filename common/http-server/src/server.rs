use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common_database::{get_pool, Client, PgStore, PoolSettings, Store};
use common_metrics::MetricsRegistry;
use eyre::{Result, WrapErr};
use tracing::{info, warn};

use crate::lifecycle::{DrainOutcome, Lifecycle};
use crate::resource::{resource_routes, Resource, ResourceState};
use crate::router::router;
use crate::shutdown::graceful_shutdown;

/// How long a clean drain waits for the pool to close before exiting anyway.
const POOL_CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Everything a service needs to run, independent of how it was configured.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub name: &'static str,
    pub bind: String,
    pub database_url: String,
    pub pool: PoolSettings,
    pub metrics_prefix: String,
    pub drain_deadline: Duration,
    pub expose_store_errors: bool,
}

/// Run the service for `R` until SIGINT or SIGTERM, then drain and close the pool.
///
/// Fails before serving if the metrics, the pool or the listener can't be set up.
pub async fn run_service<R: Resource>(settings: ServiceSettings) -> Result<DrainOutcome> {
    let metrics = Arc::new(
        MetricsRegistry::new(&settings.metrics_prefix)
            .wrap_err("failed to register service metrics")?,
    );

    let pool = get_pool(&settings.database_url, &settings.pool)
        .await
        .wrap_err("failed to create postgres pool")?;
    info!(
        service = settings.name,
        max_connections = settings.pool.max_connections,
        "postgres pool ready"
    );

    let store: Arc<dyn Store<R>> = Arc::new(PgStore::from_pool(pool.clone()));
    let state = ResourceState::new(store).expose_store_errors(settings.expose_store_errors);
    let app = router(resource_routes(state), metrics);

    let lifecycle = Lifecycle::new(settings.drain_deadline);
    let listener = lifecycle
        .bind(settings.bind.as_str())
        .await
        .wrap_err_with(|| format!("failed to bind {}", settings.bind))?;

    let outcome = lifecycle
        .run(listener, app, graceful_shutdown())
        .await
        .wrap_err("server failed")?;

    if let Some(stats) = pool.get_pool_stats() {
        info!(
            service = settings.name,
            size = stats.size,
            idle = stats.num_idle,
            "closing postgres pool"
        );
    }
    if !close_pool(pool.close(), outcome, POOL_CLOSE_GRACE).await {
        warn!(
            service = settings.name,
            ?outcome,
            "postgres pool left open, connections are still checked out"
        );
    }
    info!(service = settings.name, ?outcome, "service stopped");

    Ok(outcome)
}

/// Wait at most `grace` for `close` and report whether it finished.
///
/// After a missed drain deadline abandoned requests may still hold connections, and
/// closing the pool would wait for them, so the close is skipped entirely.
async fn close_pool<F>(close: F, outcome: DrainOutcome, grace: Duration) -> bool
where
    F: Future<Output = ()>,
{
    match outcome {
        DrainOutcome::DeadlineElapsed => false,
        DrainOutcome::Completed => tokio::time::timeout(grace, close).await.is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use std::future::{pending, ready};
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn closes_after_a_clean_drain() {
        assert!(close_pool(ready(()), DrainOutcome::Completed, POOL_CLOSE_GRACE).await);
    }

    #[tokio::test]
    async fn skips_close_after_the_deadline() {
        let begin = Instant::now();

        let closed = close_pool(pending(), DrainOutcome::DeadlineElapsed, Duration::from_secs(30)).await;

        assert!(!closed);
        assert!(begin.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn stuck_close_is_bounded_by_the_grace_period() {
        let begin = Instant::now();

        let closed = close_pool(pending(), DrainOutcome::Completed, Duration::from_millis(50)).await;

        assert!(!closed);
        assert!(begin.elapsed() < Duration::from_secs(1));
    }
}
