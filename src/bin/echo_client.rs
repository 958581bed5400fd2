// ABOUTME: Minimal demo client that connects, sends one message per line of stdin, and prints replies
// ABOUTME: Usage: echo_client [server_addr], defaults to 127.0.0.1:7070

use frameio::{TcpFramedClient, DEFAULT_MAX_MESSAGE_SIZE};
use std::io::BufRead;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let addr = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:7070".to_string());
    let mut client = TcpFramedClient::connect(&addr, DEFAULT_MAX_MESSAGE_SIZE).await?;
    println!("connected to {addr}");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        client.send_message(line.clone()).await?;
        match client.recv_message().await? {
            Some(reply) => println!("echo: {}", String::from_utf8_lossy(&reply)),
            None => {
                println!("server closed the connection");
                break;
            }
        }
    }

    client.close().await?;
    Ok(())
}
