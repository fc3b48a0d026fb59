//! Read pump: routes `iq` replies to waiting requests.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use harmony_protocol::Element;

use crate::wire::{StanzaReader, StreamEvent};

/// Requests waiting for a reply, keyed by `iq` id.
pub(crate) type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Element>>>>;

/// Reads stanzas until the stream ends or the session is cancelled.
///
/// On exit every pending request is dropped so its waiter sees the
/// connection as closed.
pub(crate) async fn read_pump<R>(
    mut reader: StanzaReader<R>,
    pending: PendingMap,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            event = reader.next() => {
                match event {
                    Ok(StreamEvent::Stanza(stanza)) => dispatch(stanza, &pending).await,
                    Ok(StreamEvent::Opened(_)) => {
                        warn!("hub reopened its stream mid-session");
                    }
                    Ok(StreamEvent::Closed) => {
                        debug!("hub closed the stream");
                        break;
                    }
                    Err(e) => {
                        warn!("hub read error: {e}");
                        break;
                    }
                }
            }
        }
    }

    pending.lock().await.clear();
}

/// Hands an `iq` reply to its waiter; other stanzas are dropped.
async fn dispatch(stanza: Element, pending: &PendingMap) {
    if stanza.local_name() != "iq" {
        trace!(stanza = %stanza.local_name(), "ignoring unsolicited stanza");
        return;
    }

    let Some(id) = stanza.attr("id").map(str::to_owned) else {
        trace!("ignoring iq without id");
        return;
    };

    match pending.lock().await.remove(&id) {
        Some(tx) => {
            let _ = tx.send(stanza);
        }
        None => trace!(%id, "no request waiting for iq"),
    }
}
