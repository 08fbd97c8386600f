//! Processing-notification channel.
//!
//! One long-lived WebSocket per client id, opened when the presentation
//! session starts and independent of any particular upload. The server
//! pushes a `processing_complete` event once its pipeline has finished
//! turning an ingested document into queryable knowledge; everything else
//! on the socket is ignored.

mod channel;
mod event;

pub use channel::{DisconnectCallback, NotifyChannel};
pub use event::{ProcessingComplete, parse_event};

/// Errors from the notification channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
}
