//! Shared runtime for the record services
//!
//! Every service in this workspace is the same program parameterized by one
//! record type. This crate holds everything but the record:
//!
//! - **Resources**: [`Resource`] describes how a record is exposed over HTTP, and
//!   [`resource_routes`] mounts its create, read and (optionally) list handlers
//! - **Middleware**: [`track_requests`] times every request, records it in the
//!   service's [`MetricsRegistry`](common_metrics::MetricsRegistry), logs it, and
//!   turns handler panics into 500 responses
//! - **Lifecycle**: [`Lifecycle`] serves a listener until [`graceful_shutdown`]
//!   resolves, then drains in-flight requests under a deadline
//! - **Runner**: [`run_service`] wires the above to a Postgres pool
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use common_database::{MemoryStore, Store};
//! use common_metrics::MetricsRegistry;
//! use http_server::{resource_routes, router, Resource, ResourceState};
//!
//! fn app<R: Resource>() -> axum::Router {
//!     let store: Arc<dyn Store<R>> = Arc::new(MemoryStore::<R>::new());
//!     let metrics = Arc::new(MetricsRegistry::new("examplesvc").expect("valid prefix"));
//!     router(resource_routes(ResourceState::new(store)), metrics)
//! }
//! ```

pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod resource;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod telemetry;

pub use error::ApiError;
pub use lifecycle::{DrainOutcome, Lifecycle, Phase};
pub use middleware::{track_requests, UNMATCHED_ROUTE};
pub use resource::{resource_routes, Resource, ResourceState};
pub use router::router;
pub use server::{run_service, ServiceSettings};
pub use shutdown::graceful_shutdown;
pub use telemetry::init_tracing;
