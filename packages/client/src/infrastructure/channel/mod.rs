//! Session channel implementations.

pub mod websocket;

pub use websocket::WebSocketChannel;
