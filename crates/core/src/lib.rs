//! Core types, geofencing, token primitives, and validation for the
//! campus attendance engine.

pub mod attendance;
pub mod error;
pub mod events;
pub mod geofence;
pub mod limits;
pub mod schema;
pub mod session;
pub mod token;

pub use attendance::*;
pub use error::{Error, Result};
pub use events::*;
pub use geofence::*;
pub use session::*;
pub use token::*;
