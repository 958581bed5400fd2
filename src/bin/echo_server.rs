// ABOUTME: Minimal demo server that frames connections and echoes every message back
// ABOUTME: Usage: echo_server [bind_addr], defaults to 127.0.0.1:7070

use std::future::Future;

use bytes::Bytes;
use frameio::{FramedClientHandle, FramedHandler, FramedServer, DEFAULT_MAX_MESSAGE_SIZE};

struct Echo {
    handle: Option<FramedClientHandle>,
}

impl FramedHandler for Echo {
    fn on_connect(&mut self, handle: FramedClientHandle) -> impl Future<Output = ()> + Send {
        tracing::info!(peer = ?handle.peer_addr(), "peer connected");
        self.handle = Some(handle);
        async {}
    }

    fn on_receive(&mut self, message: Bytes) -> impl Future<Output = ()> + Send {
        let handle = self.handle.clone();
        async move {
            if let Some(handle) = handle {
                if let Err(err) = handle.send_message(message) {
                    tracing::warn!(%err, "failed to echo message back");
                }
            }
        }
    }

    fn on_message_too_long(&mut self, declared_size: u64) -> impl Future<Output = ()> + Send {
        tracing::warn!(declared_size, "dropping oversize message");
        async {}
    }

    fn on_close(&mut self, error: Option<frameio::FramedError>) -> impl Future<Output = ()> + Send {
        if let Some(err) = &error {
            tracing::info!(%err, "peer closed with error");
        } else {
            tracing::info!("peer closed");
        }
        async {}
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let addr = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:7070".to_string());
    let server = FramedServer::new(DEFAULT_MAX_MESSAGE_SIZE);

    tracing::info!(%addr, "listening");
    server.listen(addr, || Echo { handle: None }).await
}
