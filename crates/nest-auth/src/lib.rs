//! Session and identity emulator.
//!
//! Holds the one active [`Session`](nest_types::Session) of a mock client,
//! hands out fake tokens, and fans identity changes out to subscribers. The
//! query layer never consults it: callers copy identity-derived values such as
//! an owner id into their row payloads themselves.

pub mod emulator;
pub mod error;
pub mod subscription;

pub use emulator::{AuthEmulator, AuthLatency, SESSION_KEY};
pub use error::{AuthError, AuthResult};
pub use subscription::{AuthCallback, Subscription};
