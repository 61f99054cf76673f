use std::io;

use thiserror::Error;

use crate::session_store::StoreError;
use crate::validation::ValidationError;

pub const TRANSPORT_MESSAGE: &str = "No se pudo conectar con el servidor";
pub const SESSION_EXPIRED_MESSAGE: &str = "Sesión expirada. Por favor, inicia sesión nuevamente.";

/// Failures surfaced to the docente while talking to the portal backend.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Rejected locally; nothing was sent.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("No se pudo conectar con el servidor")]
    Transport(#[source] reqwest::Error),
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("Sesión expirada. Por favor, inicia sesión nuevamente.")]
    Unauthorized,
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("no se pudo leer la imagen adjunta: {0}")]
    Attachment(#[source] io::Error),
    #[error("respuesta inesperada del servidor: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("ya hay una solicitud en curso")]
    SubmissionInFlight,
}

impl PortalError {
    pub fn is_validation(&self) -> bool {
        matches!(self, PortalError::Validation(_))
    }

    /// True for failures that never reached the server.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PortalError::Validation(_)
                | PortalError::Storage(_)
                | PortalError::Attachment(_)
                | PortalError::SubmissionInFlight
        )
    }

    /// The server never answered.
    pub fn is_transport(&self) -> bool {
        matches!(self, PortalError::Transport(_))
    }

    /// Any 401, with or without a server-supplied message.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            PortalError::Unauthorized | PortalError::Backend { status: 401, .. }
        )
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::Transport(err)
    }
}

/// Pull the human-readable message out of a non-2xx body.
///
/// JSON bodies contribute their `error` field; anything unparsable is shown
/// verbatim. Empty or field-less bodies fall back to `Error <status>`.
pub fn extract_error_message(status: u16, body: &str) -> String {
    let fallback = format!("Error {status}");
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("error")
            .and_then(serde_json::Value::as_str)
            .filter(|msg| !msg.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                fallback
            } else {
                trimmed.to_string()
            }
        }
    }
}
