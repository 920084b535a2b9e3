//! Newline-delimited JSON-RPC over stdin/stdout.

use super::McpServer;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Serve on the process stdin/stdout until stdin closes.
pub async fn run(server: Arc<McpServer>) -> anyhow::Result<()> {
    info!("Serving MCP on stdio");
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve messages read from `reader`, writing replies to `writer`.
///
/// Each message is handled on its own task, so replies may be written out of
/// order; clients match them by id. Returns once the reader hits EOF and all
/// in-flight requests have been answered.
pub async fn serve<R, W>(server: Arc<McpServer>, reader: R, writer: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Value>(64);

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(message) = rx.recv().await {
            let mut line = serde_json::to_vec(&message)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        Ok::<_, anyhow::Error>(())
    });

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let server = server.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(reply) = server.handle_raw(&line).await {
                if tx.send(reply).await.is_err() {
                    debug!("stdout writer closed, dropping reply");
                }
            }
        });
    }

    debug!("stdin closed, waiting for in-flight requests");
    drop(tx);
    writer_task.await??;
    Ok(())
}
