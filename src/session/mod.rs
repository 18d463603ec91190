//! Per-connection session state: phases, login plugin exchange, boss bar
//! replication and shutdown bookkeeping.

pub mod bossbar;
pub mod handler;
pub mod lifecycle;
pub mod plugin;
pub mod state;
pub mod switch;
pub mod transport;

pub use bossbar::{BossBar, BossBarManager};
pub use handler::{Dispatch, PacketHandler, dispatch, process_frame};
pub use lifecycle::{
    DEFAULT_GRACE_PERIOD, SessionCleanup, SessionGuard, ShutdownCoordinator, ShutdownReport,
};
pub use plugin::{ExchangeError, LoginPluginExchange};
pub use state::{ConnectionState, IdentifiedKey, PhaseError};
pub use switch::BackendSwitch;
pub use transport::{FramedTransport, MemoryTransport, Transport, TransportEvent};
