use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::info;

/// Resolves once the process receives SIGTERM or SIGINT, whichever comes first.
///
/// Hand it to [`Lifecycle::run`](crate::Lifecycle::run) to move the service into
/// draining. Handlers are installed on first poll. Unix only, and panics if the
/// runtime was built without its signal driver.
pub async fn graceful_shutdown() {
    let mut term = install(SignalKind::terminate(), "SIGTERM");
    let mut interrupt = install(SignalKind::interrupt(), "SIGINT");

    let received = tokio::select! {
        _ = term.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
    };
    info!(signal = received, "shutdown signal received");
}

fn install(kind: SignalKind, name: &str) -> Signal {
    signal(kind).unwrap_or_else(|e| panic!("failed to register {name} handler: {e}"))
}
