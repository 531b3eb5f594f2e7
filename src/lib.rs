//! Carelink — client-side synchronization and view-state layer for a
//! patient/GP portal.
//!
//! The backend is an external REST service; this crate owns everything
//! in front of it: transport, the login session, the four-panel view
//! state, record/message/appointment synchronizers, and the upload
//! pipeline. Rendering stays out — panels are produced as plain
//! view-model values for whatever UI hosts the crate.

pub mod appointments;
pub mod config;
pub mod messaging;
pub mod models;
pub mod notice;
pub mod portal;
pub mod records;
pub mod review;
pub mod routes;
pub mod session;
pub mod transport;
pub mod upload;
pub mod view;

use tracing_subscriber::EnvFilter;

pub use portal::{Portal, PortalError};

/// Initialize tracing for host applications.
///
/// Honours `RUST_LOG` when set, else falls back to the crate default.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
