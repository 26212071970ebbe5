//! # Eggplot Session
//!
//! The async orchestration layer on top of the pure geometry crates:
//!
//! - [`store`]: the file-storage interface the plotter exposes (list, load,
//!   save, delete, print) plus a local-directory implementation.
//! - [`feed`]: the live status feed with reconnect and heartbeat handling,
//!   reconciling partial messages into a watched [`PrintStatus`].
//! - [`session`]: the drawing session, recomputing the transform pipeline
//!   from the latest source and configuration snapshot with debounced
//!   config changes and cancellable re-imports.
//!
//! [`PrintStatus`]: eggplot_protocol::PrintStatus

pub mod feed;
pub mod session;
pub mod store;

pub use feed::{run_status_feed, StatusFeed, StatusFeedConnector, HEARTBEAT_TIMEOUT, RECONNECT_DELAY};
pub use session::{CreateSession, SessionOutput, DEBOUNCE_DELAY};
pub use store::{FileStore, LocalStore};
