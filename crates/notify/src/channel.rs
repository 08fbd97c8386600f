//! WebSocket channel lifecycle — connect, pumps, teardown.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::NotifyError;
use crate::event::{ProcessingComplete, parse_event};

/// Callback fired when the channel closes or errors.
///
/// Channel loss is non-fatal: it only means pending completion events will
/// not arrive until the embedding application opens a new channel.
pub type DisconnectCallback = Box<dyn Fn() + Send + Sync>;

pub(crate) type DisconnectSlot = Arc<Mutex<Option<DisconnectCallback>>>;

/// Buffered events between the read pump and the consumer.
const EVENT_BUFFER: usize = 64;

/// A live notification channel for one client id.
///
/// Opened once per presentation session, shared by every upload issued
/// under the same client id, and closed when the session ends. There is
/// no automatic reconnection; use the disconnect callback to reopen.
pub struct NotifyChannel {
    events_rx: Option<mpsc::Receiver<ProcessingComplete>>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    on_disconnect: DisconnectSlot,
    cancel: CancellationToken,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
}

impl NotifyChannel {
    /// Connects to `{base_url}/api/v1/ws/processing/{client_id}`.
    ///
    /// `base_url` uses the `ws://` or `wss://` scheme. No handshake payload
    /// is sent; the server starts pushing events as they happen.
    pub async fn connect(base_url: &str, client_id: &str) -> Result<Self, NotifyError> {
        let url = format!(
            "{}/api/v1/ws/processing/{client_id}",
            base_url.trim_end_matches('/')
        );
        let (ws_stream, _) = tokio_tungstenite::connect_async(&url).await?;
        let (write, read) = ws_stream.split();

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(16);
        let on_disconnect: DisconnectSlot = Arc::new(Mutex::new(None));
        let cancel = CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let on_disconnect = on_disconnect.clone();
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(read_pump(read, events_tx, write_tx, on_disconnect, cancel))
        };

        debug!(%url, "notification channel open");

        Ok(Self {
            events_rx: Some(events_rx),
            write_tx,
            on_disconnect,
            cancel,
            _read_handle: read_handle,
            _write_handle: write_handle,
        })
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<ProcessingComplete>> {
        self.events_rx.take()
    }

    /// Sets the callback fired when the channel closes or errors.
    pub async fn set_disconnect_callback(&self, cb: DisconnectCallback) {
        *self.on_disconnect.lock().await = Some(cb);
    }

    /// Gracefully closes the channel.
    pub async fn close(&self) {
        self.cancel.cancel();
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
    }
}

impl Drop for NotifyChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
    }
}

/// Reads frames from the socket and forwards parsed events.
///
/// Delivery never blocks this loop: events are handed off with `try_send`
/// and dropped with a warning if the consumer has fallen behind.
pub(crate) async fn read_pump<S>(
    mut read: S,
    events_tx: mpsc::Sender<ProcessingComplete>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    on_disconnect: DisconnectSlot,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            msg = read.next() => {
                match msg {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        let Some(event) = parse_event(&text) else {
                            trace!("dropping unrecognized frame");
                            continue;
                        };
                        debug!(document_id = %event.document_id, "processing complete");
                        if events_tx.try_send(event).is_err() {
                            warn!("event consumer lagging — completion event dropped");
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(data))) => {
                        let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                    }
                    Some(Ok(tungstenite::Message::Close(_))) => {
                        debug!("server closed notification channel");
                        break;
                    }
                    Some(Ok(_)) => {} // Binary / Pong — ignore
                    Some(Err(e)) => {
                        warn!("notification channel read error: {e}");
                        break;
                    }
                    None => {
                        debug!("notification channel stream ended");
                        break;
                    }
                }
            }
        }
    }

    if let Some(cb) = on_disconnect.lock().await.as_ref() {
        cb();
    }
}

/// Writes outbound frames (pong replies, close) to the socket.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => {
                match msg {
                    Some(m) => {
                        if let Err(e) = write.send(m).await {
                            warn!("notification channel write error: {e}");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    let _ = write.send(tungstenite::Message::Close(None)).await;
}
