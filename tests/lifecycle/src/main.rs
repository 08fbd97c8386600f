fn main() {
    println!("Run `cargo test -p lifecycle` to execute the end-to-end lifecycle tests.");
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::path::{Path, PathBuf};
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    use docport_notify::parse_event;
    use docport_upload::{
        ChunkRequest, ClientId, SessionCorrelator, TransferClient, UploadConfig,
        UploadCoordinator, UploadError, UploadEvent, UploadState,
    };

    /// Transfer backend that acks everything with a fixed document id.
    struct AckAll {
        document_id: String,
        chunk_indices: Mutex<Vec<u64>>,
    }

    impl AckAll {
        fn new(document_id: &str) -> Arc<Self> {
            Arc::new(Self {
                document_id: document_id.into(),
                chunk_indices: Mutex::new(Vec::new()),
            })
        }
    }

    impl TransferClient for AckAll {
        fn upload_whole<'a>(
            &'a self,
            _filename: &'a str,
            _data: Vec<u8>,
            _client_id: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + 'a>> {
            Box::pin(async move { Ok(self.document_id.clone()) })
        }

        fn upload_chunk<'a>(
            &'a self,
            req: ChunkRequest<'a>,
        ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + 'a>> {
            self.chunk_indices.lock().unwrap().push(req.index);
            Box::pin(async move { Ok(self.document_id.clone()) })
        }
    }

    fn write_file(dir: &Path, name: &str, len: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0x42; len]).unwrap();
        path
    }

    fn coordinator(transfer: Arc<dyn TransferClient>) -> UploadCoordinator {
        UploadCoordinator::new(
            ClientId::generate(),
            transfer,
            UploadConfig {
                chunk_size: 5,
                stuck_after: Some(std::time::Duration::from_millis(20)),
            },
        )
    }

    /// The full chunked lifecycle: select -> transfer -> assemble, then a
    /// pushed completion event (as raw channel JSON) finishes the session.
    #[tokio::test]
    async fn chunked_upload_completes_via_notification() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "thesis.pdf", 12);

        let transfer = AckAll::new("31");
        let mut coord = coordinator(transfer.clone());
        let mut ui_rx = coord.take_events().unwrap();
        let correlator = Arc::new(SessionCorrelator::new(coord.client_id().clone()));
        correlator.register(coord.session(), coord.events_sender());

        coord.select_file(&path).unwrap();
        let reached = coord.start_upload().await.unwrap();
        assert_eq!(reached, UploadState::Assembling);
        assert_eq!(*transfer.chunk_indices.lock().unwrap(), vec![0, 1, 2]);

        // The push arrives out of band, exactly as the server sends it.
        let event = parse_event(
            r#"{"event": "processing_complete", "document_id": 31, "filename": "thesis.pdf"}"#,
        )
        .unwrap();
        assert!(correlator.dispatch(&event));
        assert_eq!(coord.session().state(), UploadState::Completed);

        // Presentation layer saw the whole story in order.
        let mut states = Vec::new();
        while let Ok(ev) = ui_rx.try_recv() {
            if let UploadEvent::StateChanged { state } = ev {
                states.push(state);
            }
        }
        assert_eq!(
            states,
            vec![
                UploadState::Transferring,
                UploadState::Assembling,
                UploadState::Completed
            ]
        );
    }

    /// A completion event racing ahead of the last chunk is not actionable
    /// until the session reaches Assembling.
    #[tokio::test]
    async fn early_completion_event_is_not_actionable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "doc.pdf", 12);

        let transfer = AckAll::new("7");
        let coord = coordinator(transfer);
        let correlator = SessionCorrelator::new(coord.client_id().clone());
        correlator.register(coord.session(), coord.events_sender());

        coord.select_file(&path).unwrap();

        // Event for this document id arrives before any chunk was sent.
        let event = parse_event(
            r#"{"event": "processing_complete", "document_id": "7", "filename": "doc.pdf"}"#,
        )
        .unwrap();
        assert!(!correlator.dispatch(&event));
        assert_eq!(coord.session().state(), UploadState::Idle);

        // The upload still runs to Assembling; a re-delivered event then lands.
        coord.start_upload().await.unwrap();
        assert_eq!(coord.session().state(), UploadState::Assembling);
        assert!(correlator.dispatch(&event));
        assert_eq!(coord.session().state(), UploadState::Completed);
    }

    /// Two sequential uploads share one client id and one correlator; each
    /// completion lands on its own session.
    #[tokio::test]
    async fn sequential_uploads_share_the_channel() {
        let dir = tempfile::tempdir().unwrap();
        let client_id = ClientId::generate();
        let correlator = Arc::new(SessionCorrelator::new(client_id.clone()));

        let mut finished_sessions = Vec::new();
        for (doc_id, name) in [("1", "a.pdf"), ("2", "b.pdf")] {
            let path = write_file(dir.path(), name, 12);
            let coord = UploadCoordinator::new(
                client_id.clone(),
                AckAll::new(doc_id),
                UploadConfig {
                    chunk_size: 5,
                    stuck_after: None,
                },
            );
            correlator.register(coord.session(), coord.events_sender());
            coord.select_file(&path).unwrap();
            coord.start_upload().await.unwrap();
            finished_sessions.push(coord.session());
        }

        // Completions arrive in reverse order; each matches only its session.
        let ev2 = parse_event(r#"{"event": "processing_complete", "document_id": 2}"#).unwrap();
        let ev1 = parse_event(r#"{"event": "processing_complete", "document_id": 1}"#).unwrap();
        assert!(correlator.dispatch(&ev2));
        assert_eq!(finished_sessions[0].state(), UploadState::Assembling);
        assert_eq!(finished_sessions[1].state(), UploadState::Completed);

        assert!(correlator.dispatch(&ev1));
        assert_eq!(finished_sessions[0].state(), UploadState::Completed);
    }

    /// With the channel gone, an assembling session becomes detectably stuck
    /// instead of silently hanging or corrupting state.
    #[tokio::test]
    async fn lost_channel_leaves_detectable_stuck_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "doc.pdf", 12);

        let coord = coordinator(AckAll::new("5"));
        coord.select_file(&path).unwrap();
        coord.start_upload().await.unwrap();

        assert!(!coord.is_stuck(), "bound has not elapsed yet");
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;
        assert!(coord.is_stuck());
        assert_eq!(
            coord.session().state(),
            UploadState::Assembling,
            "stuck is a hint, not a transition"
        );
    }

    /// End-to-end over a real WebSocket: the channel delivers a pushed
    /// completion event through the correlator's run loop.
    #[tokio::test]
    async fn notification_channel_drives_correlator() {
        use futures_util::SinkExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(tokio_tungstenite::tungstenite::Message::Text(
                r#"{"event": "processing_complete", "document_id": "9", "filename": "x.pdf"}"#
                    .into(),
            ))
            .await
            .unwrap();
            // Keep the socket open until the client is done.
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        });

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "x.pdf", 12);

        let coord = coordinator(AckAll::new("9"));
        let correlator = Arc::new(SessionCorrelator::new(coord.client_id().clone()));
        correlator.register(coord.session(), coord.events_sender());

        coord.select_file(&path).unwrap();
        coord.start_upload().await.unwrap();
        assert_eq!(coord.session().state(), UploadState::Assembling);

        let mut channel = docport_notify::NotifyChannel::connect(
            &format!("ws://127.0.0.1:{port}"),
            coord.client_id().as_str(),
        )
        .await
        .unwrap();
        let events_rx = channel.take_events().unwrap();
        let dispatch = tokio::spawn(correlator.clone().run(events_rx));

        // Wait for the pushed event to land on the session.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while coord.session().state() != UploadState::Completed {
            assert!(std::time::Instant::now() < deadline, "completion never arrived");
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        channel.close().await;
        dispatch.abort();
        server.abort();
    }

    /// A file that fits in one chunk completes in the transfer itself and
    /// never waits on the notification channel.
    #[tokio::test]
    async fn small_file_never_assembles() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "tiny.pdf", 3);

        let mut coord = coordinator(AckAll::new("4"));
        let mut ui_rx = coord.take_events().unwrap();
        coord.select_file(&path).unwrap();

        let state = coord.start_upload().await.unwrap();
        assert_eq!(state, UploadState::Completed);

        drop(coord);
        let mut states = Vec::new();
        while let Ok(ev) = ui_rx.try_recv() {
            if let UploadEvent::StateChanged { state } = ev {
                states.push(state);
            }
        }
        assert_eq!(states, vec![UploadState::Completed]);
    }
}
