//! UseCase layer
//!
//! - `session`: the registration session controller

pub mod session;

pub use session::{RegistrationSession, SessionUpdate};
