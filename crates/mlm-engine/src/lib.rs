//! The rotation engine.
//!
//! Two tokio tasks run side by side: the selection loop decides the leader
//! for each upcoming meeting occurrence and records it, and the notification
//! loop mails the chosen leader. They share only an unbounded FIFO hand-off
//! queue and a [`Shutdown`] signal; everything else goes through the
//! [`RotationStore`](mlm_core::store::RotationStore).
//!
//! ```text
//! schedule ──▶ SelectionLoop ──▶ selector ──▶ store.record_selection
//!                    │
//!                    └──▶ queue ──▶ NotificationLoop ──▶ Notifier (SMTP)
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod notify;
pub mod rotation;
pub mod selection;
pub mod shutdown;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, MailConfig};
pub use error::{Error, Result};
pub use rotation::Rotation;
pub use shutdown::{Shutdown, ShutdownListener};
