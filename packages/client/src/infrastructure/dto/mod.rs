//! Data Transfer Objects (DTOs) for the registration service protocol.
//!
//! - `websocket`: WebSocket message DTOs
//! - `conversion`: DTO ↔ domain conversion and inbound decoding

pub mod conversion;
pub mod websocket;

pub use conversion::decode_inbound;
