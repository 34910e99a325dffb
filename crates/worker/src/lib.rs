//! Background workers for the attendance engine.
//!
//! - Rotation (one token-issuing task per active session)
//! - Token sweep (expired token deletion)
//! - Metrics log and store health probe
//! - Notification relay (engine events to the log)

pub mod notifications;
pub mod rotation;
pub mod scheduler;
pub mod token_sweep;

pub use notifications::NotificationRelay;
pub use rotation::RotationRegistry;
pub use scheduler::*;
pub use token_sweep::TokenSweeper;
