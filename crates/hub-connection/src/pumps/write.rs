//! Write pump: serialises outbound stanzas onto the socket.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use harmony_protocol::stanza::STREAM_CLOSE;

/// Writes queued stanzas. On cancel or when the queue closes, sends the
/// stream close tag and shuts the socket down without waiting for the
/// hub to acknowledge.
pub(crate) async fn write_pump<W>(
    mut write: W,
    mut write_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => {
                match msg {
                    Some(xml) => {
                        let sent = async {
                            write.write_all(xml.as_bytes()).await?;
                            write.flush().await
                        };
                        if let Err(e) = sent.await {
                            error!("hub write error: {e}");
                            return;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    debug!("closing hub stream");
    let _ = write.write_all(STREAM_CLOSE.as_bytes()).await;
    let _ = write.shutdown().await;
}
