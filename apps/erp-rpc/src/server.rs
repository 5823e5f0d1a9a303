//! # Line Server
//!
//! Reads one JSON request per line and writes one JSON reply per line.
//! Requests are handled in arrival order. Blank lines are skipped.
//!
//! The loop ends on end of input or when `shutdown` resolves; a request
//! already being handled is finished and its reply written first.

use std::future::Future;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::dispatch::RpcHandler;

/// Serves until EOF or shutdown. Returns the number of replies written.
pub async fn serve<R, W, S>(
    handler: &RpcHandler,
    reader: R,
    mut writer: W,
    shutdown: S,
) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut replies = 0u64;
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping request loop");
                break;
            }
            next = lines.next_line() => next?,
        };

        let Some(line) = next else {
            info!("Input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        debug!(bytes = line.len(), "Request line received");
        let reply = handler.handle_line(&line).await;

        let mut out = serde_json::to_vec(&reply).map_err(io::Error::other)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
        replies += 1;
    }

    Ok(replies)
}
