//! Infrastructure layer: wire DTOs, the WebSocket channel and session
//! stores. Implements the traits the domain layer defines.

pub mod channel;
pub mod dto;
pub mod session_store;
