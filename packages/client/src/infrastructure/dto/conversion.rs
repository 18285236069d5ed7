//! Conversion logic between DTOs and domain types.

use serde_json::Value;

use crate::domain::{
    ChatMessage, FORM_ACK_SENTINEL, FormField, FormPatch, InboundEvent, OutboundMessage, Sender,
    SessionId,
};
use crate::infrastructure::dto::websocket::{HistoryEntryDto, InboundPayload, OutboundDto};

/// Categories the service groups form fields under.
const FORM_CATEGORIES: [&str; 3] = ["personal", "medical", "symptom_details"];

// ========================================
// Domain → DTO
// ========================================

impl<'a> From<&'a OutboundMessage> for OutboundDto<'a> {
    fn from(message: &'a OutboundMessage) -> Self {
        match message {
            OutboundMessage::Init { session_id } => OutboundDto::Init {
                user_id: session_id.as_ref().map(SessionId::as_str),
            },
            OutboundMessage::FormUpdate { form } => OutboundDto::FormUpdate { data: form },
            OutboundMessage::Chat {
                message,
                session_id,
            } => OutboundDto::Chat {
                message,
                user_id: session_id.as_ref().map(SessionId::as_str),
            },
        }
    }
}

/// Encode an outbound message as a JSON text frame
pub fn encode_outbound(message: &OutboundMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutboundDto::from(message))
}

// ========================================
// DTO → Domain
// ========================================

/// Decode an inbound text frame into events.
///
/// # Errors
///
/// Returns an error when the frame is not a JSON object of the expected shape.
pub fn decode_inbound(text: &str) -> Result<Vec<InboundEvent>, serde_json::Error> {
    let payload: InboundPayload = serde_json::from_str(text)?;
    Ok(payload.into_events())
}

impl InboundPayload {
    /// Classify the payload.
    ///
    /// A session identifier comes first. A `chat_history` array replaces the
    /// conversation; otherwise `reply` and `form` form an incremental update.
    /// Test recommendations come last.
    pub fn into_events(self) -> Vec<InboundEvent> {
        let mut events = Vec::new();

        if let Some(user_id) = self.user_id {
            match SessionId::new(user_id) {
                Ok(session_id) => events.push(InboundEvent::SessionAssigned(session_id)),
                Err(e) => tracing::warn!("Ignoring session identifier: {}", e),
            }
        }

        match self.chat_history {
            Some(Value::Array(entries)) => {
                events.push(InboundEvent::HistoryReplaced(decode_history(entries)));
            }
            _ => {
                let reply = self
                    .reply
                    .and_then(decode_reply)
                    .filter(|reply| !reply.is_empty() && reply != FORM_ACK_SENTINEL);
                let form = self.form.as_ref().map(decode_form_patch);
                if reply.is_some() || form.is_some() {
                    events.push(InboundEvent::IncrementalUpdate { reply, form });
                }
            }
        }

        if let Some(tests) = self.tests.and_then(decode_tests) {
            events.push(InboundEvent::TestsRecommended(tests));
        }

        events
    }
}

fn decode_reply(value: Value) -> Option<String> {
    match value {
        Value::String(reply) => Some(reply),
        Value::Null => None,
        other => {
            tracing::warn!("Ignoring non-string reply: {}", other);
            None
        }
    }
}

fn decode_tests(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(entries) => Some(
            entries
                .into_iter()
                .filter_map(|entry| match entry {
                    Value::String(test) => Some(test),
                    other => {
                        tracing::debug!("Skipping non-string test entry: {}", other);
                        None
                    }
                })
                .collect(),
        ),
        Value::Null => None,
        other => {
            tracing::warn!("Ignoring non-array test list: {}", other);
            None
        }
    }
}

fn decode_history(entries: Vec<Value>) -> Vec<ChatMessage> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<HistoryEntryDto>(entry) {
            Ok(dto) => Some(ChatMessage::from(dto)),
            Err(e) => {
                tracing::warn!("Skipping malformed history entry: {}", e);
                None
            }
        })
        .collect()
}

impl From<HistoryEntryDto> for ChatMessage {
    fn from(dto: HistoryEntryDto) -> Self {
        let sender = match dto.sender.as_deref() {
            Some(name) => Sender::from_wire(name).unwrap_or_else(|| {
                tracing::debug!("Unknown sender '{}', treating as bot", name);
                Sender::Bot
            }),
            None => {
                tracing::debug!("History entry without sender, treating as bot");
                Sender::Bot
            }
        };
        ChatMessage::new(sender, dto.message.unwrap_or_default())
    }
}

/// Decode a `form` object into a patch.
///
/// Category objects are flattened, `null` becomes an empty string and
/// unknown keys are ignored.
pub fn decode_form_patch(value: &Value) -> FormPatch {
    let mut patch = FormPatch::new();
    collect_form_entries(value, &mut patch);
    patch
}

fn collect_form_entries(value: &Value, patch: &mut FormPatch) {
    let Some(object) = value.as_object() else {
        tracing::warn!("Ignoring non-object form patch");
        return;
    };

    for (key, value) in object {
        if FORM_CATEGORIES.contains(&key.as_str()) && value.is_object() {
            collect_form_entries(value, patch);
            continue;
        }

        let Some(field) = FormField::from_key(key) else {
            tracing::debug!("Ignoring unknown form key '{}'", key);
            continue;
        };

        match value {
            Value::String(s) => patch.insert(field, s.as_str()),
            Value::Null => patch.insert(field, ""),
            Value::Number(n) => patch.insert(field, n.to_string()),
            Value::Bool(b) => patch.insert(field, b.to_string()),
            Value::Array(_) | Value::Object(_) => {
                tracing::debug!("Ignoring non-scalar value for form key '{}'", key);
            }
        }
    }
}
