//! Move service protocol.
//!
//! The service is a JSON-over-HTTP endpoint pair:
//!
//! - `POST /move` with `{"fen": ..., "difficulty": n}` answers
//!   `{"best_move": "e7e5", "move_history": [...]}` or `{"error": "..."}`.
//! - `POST /evaluate` with `{"fen": ...}` answers
//!   `{"evaluation": {"type": "cp" | "mate", "value": n}}` or `{"error": "..."}`.
//!
//! Decoding is transport independent so the browser `fetch` path and the
//! native `reqwest` path agree on every error case.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::PlayError;

/// Body of a `/move` request. `id` stays local and pairs the reply with
/// the request that is still outstanding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveRequest {
    #[serde(skip)]
    pub id: u64,
    pub fen: String,
    pub difficulty: u8,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MoveReply {
    #[serde(default)]
    pub best_move: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Positions the service has seen. Logged only; local history wins.
    #[serde(default)]
    pub move_history: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EvaluationRequest {
    #[serde(skip)]
    pub id: u64,
    pub fen: String,
}

/// Engine score from White's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Evaluation {
    /// Centipawns.
    Cp(i32),
    /// Moves to mate; negative when Black mates.
    Mate(i32),
}

impl Evaluation {
    /// Short label such as `+0.35`, `-1.20` or `#-3`.
    pub fn label(&self) -> String {
        match *self {
            Evaluation::Cp(cp) => format!("{:+.2}", f64::from(cp) / 100.0),
            Evaluation::Mate(n) => format!("#{n}"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct EvaluationReply {
    #[serde(default)]
    evaluation: Option<Evaluation>,
    #[serde(default)]
    error: Option<String>,
}

fn check_status(status: u16, status_text: &str) -> Result<(), PlayError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let text = if status_text.is_empty() {
        format!("HTTP {status}")
    } else {
        status_text.to_string()
    };
    Err(PlayError::Status { code: status, text })
}

/// Turn a `/move` response into the coordinate move it carries.
pub fn decode_move_reply(status: u16, status_text: &str, body: &str) -> Result<String, PlayError> {
    check_status(status, status_text)?;
    let reply: MoveReply =
        serde_json::from_str(body).map_err(|e| PlayError::Malformed(e.to_string()))?;
    if let Some(error) = reply.error {
        return Err(PlayError::Service(error));
    }
    if let Some(history) = &reply.move_history {
        debug!("service reports {} positions in its history", history.len());
    }
    reply
        .best_move
        .ok_or_else(|| PlayError::Malformed("reply has no best_move".to_string()))
}

/// Turn an `/evaluate` response into an [`Evaluation`].
pub fn decode_evaluation_reply(
    status: u16,
    status_text: &str,
    body: &str,
) -> Result<Evaluation, PlayError> {
    check_status(status, status_text)?;
    let reply: EvaluationReply =
        serde_json::from_str(body).map_err(|e| PlayError::Malformed(e.to_string()))?;
    if let Some(error) = reply.error {
        return Err(PlayError::Service(error));
    }
    reply
        .evaluation
        .ok_or_else(|| PlayError::Malformed("reply has no evaluation".to_string()))
}

/// Something that answers move and evaluation requests synchronously.
pub trait MoveService {
    fn best_move(&self, request: &MoveRequest) -> Result<String, PlayError>;

    fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation, PlayError>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpMoveService;

#[cfg(not(target_arch = "wasm32"))]
mod http {
    use log::debug;
    use serde::Serialize;

    use super::{
        decode_evaluation_reply, decode_move_reply, Evaluation, EvaluationRequest, MoveRequest,
        MoveService,
    };
    use crate::config::Config;
    use crate::error::PlayError;

    /// Blocking HTTP client for the move service.
    pub struct HttpMoveService {
        client: reqwest::blocking::Client,
        move_url: String,
        evaluate_url: String,
    }

    impl HttpMoveService {
        pub fn new(config: &Config) -> Result<Self, PlayError> {
            let client = reqwest::blocking::Client::builder()
                .build()
                .map_err(|e| PlayError::Transport(e.to_string()))?;
            Ok(HttpMoveService {
                client,
                move_url: config.move_url(),
                evaluate_url: config.evaluate_url(),
            })
        }

        fn post<T: Serialize>(&self, url: &str, body: &T) -> Result<(u16, String, String), PlayError> {
            debug!("POST {url}");
            let response = self
                .client
                .post(url)
                .json(body)
                .send()
                .map_err(|e| PlayError::Transport(e.to_string()))?;
            let status = response.status();
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            let text = response
                .text()
                .map_err(|e| PlayError::Transport(e.to_string()))?;
            Ok((status.as_u16(), status_text, text))
        }
    }

    impl MoveService for HttpMoveService {
        fn best_move(&self, request: &MoveRequest) -> Result<String, PlayError> {
            let (status, status_text, body) = self.post(&self.move_url, request)?;
            decode_move_reply(status, &status_text, &body)
        }

        fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation, PlayError> {
            let (status, status_text, body) = self.post(&self.evaluate_url, request)?;
            decode_evaluation_reply(status, &status_text, &body)
        }
    }
}
