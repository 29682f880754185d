//! End-to-end tests of two connections talking over an in-memory pipe.

use async_trait::async_trait;
use mapped_edits_core::{
    DocumentDataDto, DocumentFilter, ExtHostDocumentsShape, ExtHostMappedEditsShape,
    MainThreadMappedEditsShape, MappedEditsContextDto, MappedEditsError, ProviderHandle,
    ResourceEditsDto, Result, TextEditDto, UriComponents, WorkspaceEditDto,
};
use mapped_edits_rpc::{
    Connection, ExtHostDispatcher, ExtHostProxy, MainThreadDispatcher, MainThreadProxy, Message,
    framing,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{Position, Range};

#[derive(Default)]
struct Host {
    started: Notify,
    saw_cancel: AtomicBool,
    documents: Mutex<Vec<String>>,
}

#[async_trait]
impl ExtHostMappedEditsShape for Host {
    async fn provide_mapped_edits(
        &self,
        handle: ProviderHandle,
        document: UriComponents,
        code_blocks: Vec<String>,
        _context: MappedEditsContextDto,
        token: CancellationToken,
    ) -> Result<Option<WorkspaceEditDto>> {
        match handle.get() {
            1 => {
                let start = Position::new(0, 0);
                Ok(Some(WorkspaceEditDto {
                    changes: Some(vec![ResourceEditsDto {
                        resource: document,
                        edits: vec![TextEditDto {
                            range: Range::new(start, start),
                            text: code_blocks.join("\n"),
                            annotation_id: None,
                        }],
                    }]),
                    ..Default::default()
                }))
            }
            2 => Err(MappedEditsError::provider(std::io::Error::other("cannot map"))),
            3 => {
                self.started.notify_one();
                token.cancelled().await;
                self.saw_cancel.store(true, Ordering::SeqCst);
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

impl ExtHostDocumentsShape for Host {
    fn accept_document_opened(&self, data: DocumentDataDto) -> Result<()> {
        self.documents.lock().unwrap().push(data.uri.to_string());
        Ok(())
    }

    fn accept_document_changed(
        &self,
        _uri: UriComponents,
        _version: i32,
        _text: String,
    ) -> Result<()> {
        Ok(())
    }

    fn accept_document_closed(&self, _uri: UriComponents) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Main {
    registered: Mutex<Vec<(ProviderHandle, Vec<DocumentFilter>)>>,
    notified: Notify,
}

impl MainThreadMappedEditsShape for Main {
    fn register_provider(
        &self,
        handle: ProviderHandle,
        selector: Vec<DocumentFilter>,
    ) -> Result<()> {
        self.registered.lock().unwrap().push((handle, selector));
        self.notified.notify_one();
        Ok(())
    }

    fn unregister_provider(&self, handle: ProviderHandle) -> Result<()> {
        self.registered
            .lock()
            .unwrap()
            .retain(|(h, _)| *h != handle);
        self.notified.notify_one();
        Ok(())
    }
}

struct Pair {
    ext_host: ExtHostProxy,
    main_thread: MainThreadProxy,
    host: Arc<Host>,
    main: Arc<Main>,
}

fn connect() -> Pair {
    let (a, b) = tokio::io::duplex(64 * 1024);
    let (a_read, a_write) = tokio::io::split(a);
    let (b_read, b_write) = tokio::io::split(b);

    let host = Arc::new(Host::default());
    let main = Arc::new(Main::default());

    let (main_peer, main_connection) = Connection::new(a_read, a_write);
    let (host_peer, host_connection) = Connection::new(b_read, b_write);

    tokio::spawn(main_connection.serve(Arc::new(MainThreadDispatcher::new(main.clone()))));
    tokio::spawn(host_connection.serve(Arc::new(ExtHostDispatcher::new(
        host.clone(),
        host.clone(),
    ))));

    Pair {
        ext_host: ExtHostProxy::new(main_peer),
        main_thread: MainThreadProxy::new(host_peer),
        host,
        main,
    }
}

/// Handle the test host serves by waiting for cancellation.
const BLOCKING: ProviderHandle = ProviderHandle::new(3);

fn uri() -> UriComponents {
    UriComponents::parse("file:///proj/main.py").unwrap()
}

fn empty_context() -> MappedEditsContextDto {
    MappedEditsContextDto {
        selections: vec![],
        related: vec![],
        changes_before: None,
    }
}

#[tokio::test]
async fn test_call_returns_edit() {
    let pair = connect();
    let edit = pair
        .ext_host
        .provide_mapped_edits(
            ProviderHandle::new(1),
            uri(),
            vec!["a".into(), "b".into()],
            empty_context(),
            CancellationToken::new(),
        )
        .await
        .unwrap()
        .unwrap();

    let changes = edit.changes.unwrap();
    assert_eq!(changes[0].resource, uri());
    assert_eq!(changes[0].edits[0].text, "a\nb");
}

#[tokio::test]
async fn test_absence_crosses_the_boundary() {
    let pair = connect();
    let result = pair
        .ext_host
        .provide_mapped_edits(
            ProviderHandle::new(99),
            uri(),
            vec![],
            empty_context(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_failure_becomes_provider_failure() {
    let pair = connect();
    let err = pair
        .ext_host
        .provide_mapped_edits(
            ProviderHandle::new(2),
            uri(),
            vec![],
            empty_context(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        MappedEditsError::ProviderFailure { handle, message } => {
            assert_eq!(handle, ProviderHandle::new(2));
            assert_eq!(message, "cannot map");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_cancellation_reaches_the_provider() {
    let pair = connect();
    let token = CancellationToken::new();

    let call = {
        let proxy = pair.ext_host.clone();
        let token = token.clone();
        tokio::spawn(async move {
            proxy
                .provide_mapped_edits(BLOCKING, uri(), vec![], empty_context(), token)
                .await
        })
    };

    pair.host.started.notified().await;
    token.cancel();

    let result = call.await.unwrap();
    assert!(matches!(result, Ok(None)));

    tokio::time::timeout(Duration::from_secs(5), async {
        while !pair.host.saw_cancel.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let pair = connect();
    let token = CancellationToken::new();

    let slow = {
        let proxy = pair.ext_host.clone();
        let token = token.clone();
        tokio::spawn(async move {
            proxy
                .provide_mapped_edits(BLOCKING, uri(), vec![], empty_context(), token)
                .await
        })
    };
    pair.host.started.notified().await;

    let fast = pair
        .ext_host
        .provide_mapped_edits(
            ProviderHandle::new(1),
            uri(),
            vec!["x".into()],
            empty_context(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(fast.is_some());

    token.cancel();
    assert!(matches!(slow.await.unwrap(), Ok(None)));
}

#[tokio::test]
async fn test_registration_notifications_reach_main_side() {
    let pair = connect();

    let selector = vec![DocumentFilter::language("python")];
    pair.main_thread
        .register_provider(ProviderHandle::new(1), selector)
        .unwrap();
    pair.main.notified.notified().await;
    assert_eq!(pair.main.registered.lock().unwrap().len(), 1);

    pair.main_thread
        .unregister_provider(ProviderHandle::new(1))
        .unwrap();
    pair.main.notified.notified().await;
    assert!(pair.main.registered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_document_notification_precedes_later_call() {
    let pair = connect();

    pair.ext_host
        .accept_document_opened(DocumentDataDto {
            uri: uri(),
            language_id: "python".into(),
            version: 1,
            text: "print()".into(),
        })
        .unwrap();
    pair.ext_host
        .provide_mapped_edits(
            ProviderHandle::new(99),
            uri(),
            vec![],
            empty_context(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        *pair.host.documents.lock().unwrap(),
        ["file:///proj/main.py"]
    );
}

#[tokio::test]
async fn test_disconnect_fails_pending_call() {
    let (a, b) = tokio::io::duplex(64 * 1024);
    let (a_read, a_write) = tokio::io::split(a);
    let (peer, connection) = Connection::new(a_read, a_write);
    let served = tokio::spawn(connection.serve(Arc::new(MainThreadDispatcher::new(Arc::new(
        Main::default(),
    )))));

    let proxy = ExtHostProxy::new(peer.clone());
    let call = tokio::spawn(async move {
        proxy
            .provide_mapped_edits(
                ProviderHandle::new(1),
                uri(),
                vec![],
                empty_context(),
                CancellationToken::new(),
            )
            .await
    });

    // read the raw request off the other end, then hang up without answering
    let (b_read, mut b_write) = tokio::io::split(b);
    let mut reader = BufReader::new(b_read);
    let mut buf = String::new();
    let body = framing::read_frame(&mut reader, &mut buf)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(Message::decode(&body).unwrap(), Message::Request { .. }));
    b_write.shutdown().await.unwrap();
    drop(b_write);
    drop(reader);

    assert!(matches!(call.await.unwrap(), Err(MappedEditsError::Disconnected)));
    assert!(served.await.unwrap().is_ok());
    assert!(peer.is_closed());
}
