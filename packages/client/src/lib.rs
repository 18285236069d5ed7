//! Vitalink registration client.
//!
//! A patient-registration form and a chat with the registration assistant,
//! kept in sync with the service over one WebSocket connection.
//!
//! - `domain`: form, conversation, session identity and the channel capability
//! - `infrastructure`: WebSocket channel, wire DTOs and session stores
//! - `usecase`: the registration session controller
//! - `ui`: terminal front end
//! - `debounce`: quiet-period timer used for form sync

pub mod config;
pub mod debounce;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
