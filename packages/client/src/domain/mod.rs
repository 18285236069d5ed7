//! Domain layer: form, conversation, session identity and the channel
//! capability the rest of the client is written against.

pub mod channel;
pub mod conversation;
pub mod error;
pub mod form;
pub mod session;

pub use channel::{
    ChannelEvent, ChannelState, FORM_ACK_SENTINEL, InboundEvent, OutboundMessage, SessionChannel,
};
pub use conversation::{ChatMessage, ConversationLog, Sender};
pub use error::{ChannelError, FormError, SessionIdError, StoreError};
pub use form::{FormField, FormPatch, FormStore, LocalEdit, RegistrationForm};
pub use session::{SessionId, SessionStore};

#[cfg(test)]
pub use session::MockSessionStore;
