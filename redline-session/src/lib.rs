//! redline-session — serialized, event-emitting sessions over a
//! [`redline_core::SuggestionStore`].
//!
//! One tokio task owns each document's store and applies commands in arrival
//! order, which is what makes concurrent accept/reject calls safe. Session
//! settings come from a TOML config file (see [`config`]).

pub mod config;
pub mod error;
pub mod session;

pub use config::RedlineConfig;
pub use error::{Result, SessionError};
pub use session::{DocumentSession, SessionEvent, SessionHandle};
