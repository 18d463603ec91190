//! Session core for a Minecraft proxy front: version-aware packet codecs,
//! connection phases, login plugin messaging, boss bar replication and
//! graceful shutdown.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod proto;
pub mod ratelimit;
pub mod server;
pub mod session;
pub mod telemetry;

pub use config::{SessionConfig, SessionConfigLoadError};
pub use error::{ErrorResponder, SessionError};
pub use server::SessionServer;
