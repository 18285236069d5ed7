//! WebSocket message DTOs.
//!
//! Outbound messages carry a `type` discriminant. Inbound messages have no
//! discriminant: any combination of `user_id`, `chat_history`, `reply`,
//! `form` and `tests` may be present, so the payload is captured loosely
//! here and classified in `conversion`.

use serde::{Deserialize, Serialize};

use crate::domain::RegistrationForm;

/// Outbound message as written on the wire
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundDto<'a> {
    Init {
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<&'a str>,
    },
    FormUpdate {
        data: &'a RegistrationForm,
    },
    Chat {
        message: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<&'a str>,
    },
}

/// Inbound message as received from the service.
///
/// Everything but `user_id` is kept as raw JSON, so one badly typed field
/// does not cost the rest of the frame.
#[derive(Debug, Default, Deserialize)]
pub struct InboundPayload {
    #[serde(default)]
    pub user_id: Option<String>,
    /// Only honoured when it is an array
    #[serde(default)]
    pub chat_history: Option<serde_json::Value>,
    #[serde(default)]
    pub reply: Option<serde_json::Value>,
    /// Flat or grouped by category (`personal`, `medical`, `symptom_details`)
    #[serde(default)]
    pub form: Option<serde_json::Value>,
    /// Only string entries are honoured
    #[serde(default)]
    pub tests: Option<serde_json::Value>,
}

/// One entry of `chat_history`
#[derive(Debug, Deserialize)]
pub struct HistoryEntryDto {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
