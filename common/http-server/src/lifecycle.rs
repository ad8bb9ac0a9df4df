use std::future::{Future, IntoFuture};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};

/// Where a service is in its run. Moves strictly forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Serving,
    Draining,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight request finished before the deadline.
    Completed,
    /// The deadline passed first; whatever was still running got abandoned.
    DeadlineElapsed,
}

/// Drives one listener from bind to stop.
///
/// Once the shutdown future resolves the listener stops accepting, in-flight
/// requests get `drain_deadline` to finish, and [`run`](Lifecycle::run) returns.
/// Phase changes are published on a watch channel, see [`subscribe`](Lifecycle::subscribe).
#[derive(Clone)]
pub struct Lifecycle {
    phase: Arc<watch::Sender<Phase>>,
    drain_deadline: Duration,
}

impl Lifecycle {
    pub fn new(drain_deadline: Duration) -> Self {
        let (phase, _) = watch::channel(Phase::Starting);
        Self {
            phase: Arc::new(phase),
            drain_deadline,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn drain_deadline(&self) -> Duration {
        self.drain_deadline
    }

    pub async fn bind(&self, addr: impl ToSocketAddrs) -> io::Result<TcpListener> {
        TcpListener::bind(addr).await
    }

    /// Serve `app` on `listener` until `shutdown` resolves, then drain.
    ///
    /// Errors only if the accept loop itself fails. Connections still open when the
    /// deadline elapses are left to the runtime, which drops them on exit.
    pub async fn run<F>(
        &self,
        listener: TcpListener,
        app: Router,
        shutdown: F,
    ) -> io::Result<DrainOutcome>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let phase = self.phase.clone();
        let signal = async move {
            shutdown.await;
            _ = phase.send_replace(Phase::Draining);
            info!("shutdown requested, draining in-flight requests");
            _ = drain_tx.send(());
        };

        match listener.local_addr() {
            Ok(addr) => info!(%addr, "serving"),
            Err(e) => warn!(error = %e, "serving on a listener with no local address"),
        }
        _ = self.phase.send_replace(Phase::Serving);

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .into_future();

        let deadline = self.drain_deadline;
        let drain_timer = async move {
            if drain_rx.await.is_err() {
                // The server exited without a shutdown request; nothing to time.
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(deadline).await;
        };

        let outcome = tokio::select! {
            result = server => result.map(|()| DrainOutcome::Completed),
            () = drain_timer => {
                warn!(
                    deadline_secs = deadline.as_secs_f64(),
                    "drain deadline elapsed with requests still in flight"
                );
                Ok(DrainOutcome::DeadlineElapsed)
            }
        };

        _ = self.phase.send_replace(Phase::Stopped);
        info!(outcome = ?outcome.as_ref().ok(), "stopped");
        outcome
    }
}
