//! Transport boundary: newline-delimited JSON over TCP.
//!
//! The gateway only ever sees typed events on per-client channels; this
//! module is the sole place a socket appears. Each connection gets a read
//! task (lines in, decoded, handed to the gateway) and a write task
//! (server events out, one JSON object per line).

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::net::gateway::SessionGateway;
use crate::net::protocol;
use crate::room::room::ClientId;

/// Accept connections forever, one handler task per client
pub async fn serve(listener: TcpListener, gateway: SessionGateway) -> anyhow::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let gateway = gateway.clone();
        tokio::spawn(async move {
            let client_id: ClientId = Uuid::new_v4();
            info!(client = %client_id, %addr, "client connected");
            handle_connection(stream, client_id, gateway.clone()).await;
            gateway.handle_disconnect(client_id).await;
            info!(client = %client_id, "client disconnected");
        });
    }
}

async fn handle_connection(stream: TcpStream, client_id: ClientId, gateway: SessionGateway) {
    let (reader, writer) = stream.into_split();

    let (tx, mut rx) = mpsc::unbounded_channel();
    gateway.register_client(client_id, tx).await;

    let write_task = tokio::spawn(async move {
        let mut writer = BufWriter::new(writer);
        while let Some(event) = rx.recv().await {
            let line = match protocol::encode(&event) {
                Ok(line) => line,
                Err(e) => {
                    warn!(client = %client_id, error = %e, "failed to encode event");
                    continue;
                }
            };
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                break;
            }
        }
    });

    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match protocol::decode(&line) {
                    Ok(event) => gateway.handle_event(client_id, event).await,
                    // client noise: drop the line, never crash the loop
                    Err(e) => debug!(client = %client_id, error = %e, "dropping malformed event"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(client = %client_id, error = %e, "read error, closing connection");
                break;
            }
        }
    }

    write_task.abort();
}
