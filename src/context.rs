// src/context.rs
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::Error;

pub const PARTICIPANT_HEADER: &str = "x-participant-id";

/// Longer identifiers are truncated.
const MAX_PARTICIPANT_ID_CHARS: usize = 100;

/// Who is making this request. Built per request from the identifier the
/// browser keeps in local storage; nothing about it is kept server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantContext {
    pub participant_id: String,
}

impl ParticipantContext {
    pub fn new(raw: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::validation(format!("{PARTICIPANT_HEADER} header is required")));
        }
        Ok(Self {
            participant_id: trimmed.chars().take(MAX_PARTICIPANT_ID_CHARS).collect(),
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ParticipantContext {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(PARTICIPANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        Self::new(raw)
    }
}
