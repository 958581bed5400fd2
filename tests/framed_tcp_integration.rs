//! End-to-end tests exercising the framing layer over real TCP sockets
//! (as opposed to the duplex-stream unit tests in `src/client.rs`).

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use frameio::{FramedClientHandle, FramedError, FramedHandler, FramedServer, TcpFramedClient};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

struct Echo {
    handle: Option<FramedClientHandle>,
    too_long: mpsc::UnboundedSender<u64>,
}

impl FramedHandler for Echo {
    fn on_connect(&mut self, handle: FramedClientHandle) -> impl Future<Output = ()> + Send {
        self.handle = Some(handle);
        async {}
    }

    fn on_receive(&mut self, message: Bytes) -> impl Future<Output = ()> + Send {
        let handle = self.handle.clone();
        async move {
            if let Some(handle) = handle {
                let _ = handle.send_message(message);
            }
        }
    }

    fn on_message_too_long(&mut self, declared_size: u64) -> impl Future<Output = ()> + Send {
        let _ = self.too_long.send(declared_size);
        async {}
    }
}

async fn bind_and_listen(
    max_message_size: usize,
) -> (std::net::SocketAddr, mpsc::UnboundedReceiver<u64>) {
    let (too_long_tx, too_long_rx) = mpsc::unbounded_channel();
    let server = FramedServer::new(max_message_size);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    tokio::spawn(async move {
        server
            .listen(addr, move || Echo {
                handle: None,
                too_long: too_long_tx.clone(),
            })
            .await
            .unwrap();
    });

    // Give the accept loop a moment to start before the first real connect.
    tokio::time::sleep(Duration::from_millis(20)).await;

    (addr, too_long_rx)
}

#[tokio::test]
async fn one_client_round_trips_several_messages() {
    let (addr, _too_long) = bind_and_listen(4096).await;
    let mut client = TcpFramedClient::connect(addr, 4096).await.unwrap();

    for payload in ["first", "second", "third"] {
        client.send_message(payload).await.unwrap();
        let reply = client.recv_message().await.unwrap();
        assert_eq!(reply, Some(Bytes::from_static(payload.as_bytes())));
    }
}

#[tokio::test]
async fn zero_length_message_round_trips() {
    let (addr, _too_long) = bind_and_listen(4096).await;
    let mut client = TcpFramedClient::connect(addr, 4096).await.unwrap();

    client.send_message(Bytes::new()).await.unwrap();
    let reply = client.recv_message().await.unwrap();
    assert_eq!(reply, Some(Bytes::new()));
}

#[tokio::test]
async fn many_concurrent_clients_each_get_their_own_echo() {
    let (addr, _too_long) = bind_and_listen(4096).await;
    let completed = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for i in 0..16 {
        let completed = completed.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = TcpFramedClient::connect(addr, 4096).await.unwrap();
            let payload = format!("client-{i}");
            client.send_message(payload.clone()).await.unwrap();
            let reply = client.recv_message().await.unwrap();
            assert_eq!(reply, Some(Bytes::from(payload)));
            completed.fetch_add(1, Ordering::SeqCst);
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(completed.load(Ordering::SeqCst), 16);
}

#[tokio::test]
async fn oversize_message_is_reported_and_connection_keeps_working() {
    let (addr, mut too_long) = bind_and_listen(8).await;
    let mut client = TcpFramedClient::connect(addr, 8).await.unwrap();

    // This client's own max_message_size also rejects the oversize echo it
    // would otherwise receive back, but the point here is the server side:
    // it must report TooLong once and keep accepting further messages.
    client.send_message(vec![b'x'; 40]).await.unwrap();

    let declared = tokio::time::timeout(Duration::from_secs(2), too_long.recv())
        .await
        .expect("server should report TooLong promptly")
        .expect("channel should not be closed");
    assert_eq!(declared, 40);
}

#[tokio::test]
async fn malformed_size_prefix_closes_only_the_offending_connection() {
    struct CloseCapturing {
        closed: mpsc::UnboundedSender<Option<String>>,
    }

    impl FramedHandler for CloseCapturing {
        fn on_receive(&mut self, _message: Bytes) -> impl Future<Output = ()> + Send {
            async {}
        }

        fn on_close(&mut self, error: Option<FramedError>) -> impl Future<Output = ()> + Send {
            let _ = self.closed.send(error.map(|e| e.to_string()));
            async {}
        }
    }

    let (closed_tx, mut closed_rx) = mpsc::unbounded_channel();
    let server = FramedServer::new(4096);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    tokio::spawn(async move {
        server
            .listen(addr, move || CloseCapturing {
                closed: closed_tx.clone(),
            })
            .await
            .unwrap();
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // A raw stream (not TcpFramedClient) writes eight continuation-bit bytes
    // whose completion bit never clears.
    let mut bad_peer = TcpStream::connect(addr).await.unwrap();
    bad_peer.write_all(&[0xFF; 8]).await.unwrap();

    let error = tokio::time::timeout(Duration::from_secs(2), closed_rx.recv())
        .await
        .expect("server should close the malformed connection promptly")
        .expect("channel should not be closed")
        .expect("on_close should carry the InvalidEncoding error");
    assert!(error.contains("invalid size-prefix encoding"));

    // The listener itself is unaffected: a well-formed client connects fine.
    let mut good_client = TcpFramedClient::connect(addr, 4096).await.unwrap();
    good_client.send_message("still alive").await.unwrap();
}

#[tokio::test]
async fn closing_the_client_ends_the_server_side_peer_task() {
    let (addr, _too_long) = bind_and_listen(4096).await;
    let mut client = TcpFramedClient::connect(addr, 4096).await.unwrap();
    client.send_message("hi").await.unwrap();
    let _ = client.recv_message().await.unwrap();

    client.close().await.unwrap();

    // A send attempted after close must surface as a transport error rather
    // than hang or panic.
    let err = client.send_message("too late").await.unwrap_err();
    assert!(matches!(err, FramedError::Transport(_)));
}

#[tokio::test]
async fn handle_send_after_peer_disconnects_reports_broken_pipe() {
    let (tx, rx) = oneshot::channel();
    let server = FramedServer::new(4096);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    struct CaptureHandle {
        sender: Option<oneshot::Sender<FramedClientHandle>>,
    }

    impl FramedHandler for CaptureHandle {
        fn on_connect(&mut self, handle: FramedClientHandle) -> impl Future<Output = ()> + Send {
            if let Some(tx) = self.sender.take() {
                let _ = tx.send(handle);
            }
            async {}
        }

        fn on_receive(&mut self, _message: Bytes) -> impl Future<Output = ()> + Send {
            async {}
        }
    }

    let tx = Arc::new(std::sync::Mutex::new(Some(tx)));
    tokio::spawn(async move {
        server
            .listen(addr, move || CaptureHandle {
                sender: tx.lock().unwrap().take(),
            })
            .await
            .unwrap();
    });

    let client = TcpFramedClient::connect(addr, 4096).await.unwrap();
    let handle = rx.await.unwrap();

    client.close().await.unwrap();
    drop(client);
    // Give the peer task's recv a moment to observe EOF and return.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The peer task may already have exited by now; if so the send fails.
    // If it hasn't yet, a second attempt shortly after will.
    let mut result = handle.send_message(Bytes::from_static(b"late"));
    for _ in 0..20 {
        if result.is_err() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        result = handle.send_message(Bytes::from_static(b"late"));
    }
    assert!(matches!(result, Err(FramedError::Transport(_))));
}
