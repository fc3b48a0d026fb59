//! Authenticated XMPP session with a Harmony hub.
//!
//! One session lives for one logical operation: open, send one or two
//! action requests, close. Each request is an `iq` correlated by id and
//! bounded by the request timeout.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use harmony_protocol::action::{hold_action_body, parse_current_activity, start_activity_body};
use harmony_protocol::constants::mime;
use harmony_protocol::stanza::{action_request, single_action_reply};
use harmony_protocol::{
    ActionDescriptor, ActionReply, Element, HubConfiguration, ProtocolError,
    SessionToken,
};

use crate::error::SessionError;
use crate::pumps::read::PendingMap;
use crate::stream::{negotiate, next_id};
use crate::types::{SessionTimeouts, XmppIdentity};
use crate::wire::StanzaReader;

/// Open session with a hub.
pub struct HubSession {
    write_tx: mpsc::Sender<String>,
    pending: PendingMap,
    timeouts: SessionTimeouts,
    cancel: CancellationToken,
    read_handle: JoinHandle<()>,
    write_handle: Option<JoinHandle<()>>,
}

impl HubSession {
    /// Opens an operating session authenticated with a session token.
    pub async fn open(
        addr: &str,
        token: &SessionToken,
        timeouts: SessionTimeouts,
    ) -> Result<Self, SessionError> {
        Self::open_as(addr, &XmppIdentity::session(token), timeouts).await
    }

    /// Opens a session with an explicit identity.
    ///
    /// TCP connect and the whole negotiation share the connect timeout.
    pub async fn open_as(
        addr: &str,
        identity: &XmppIdentity,
        timeouts: SessionTimeouts,
    ) -> Result<Self, SessionError> {
        let connect = async {
            let stream = TcpStream::connect(addr).await?;
            stream.set_nodelay(true)?;
            let (read, mut write) = stream.into_split();
            let reader = negotiate(StanzaReader::new(read), &mut write, identity).await?;
            Ok::<_, SessionError>((reader, write))
        };
        let (reader, write) = tokio::time::timeout(timeouts.connect, connect)
            .await
            .map_err(|_| SessionError::Timeout)??;
        debug!(%addr, resource = %identity.resource, "hub session established");

        let (write_tx, write_rx) = mpsc::channel::<String>(32);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let cancel = CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let pending = pending.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::read::read_pump(reader, pending, cancel))
        };

        Ok(Self {
            write_tx,
            pending,
            timeouts,
            cancel,
            read_handle,
            write_handle: Some(write_handle),
        })
    }

    /// Sends one action request and waits for the reply `iq`.
    pub async fn request(&self, mime: &str, body: Option<&str>) -> Result<Element, SessionError> {
        let id = next_id();
        let xml = action_request(&id, mime, body).to_xml();

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        if self.write_tx.send(xml).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(SessionError::Closed);
        }

        let result = tokio::time::timeout(self.timeouts.request, rx).await;

        // Clean up pending entry on any exit path.
        self.pending.lock().await.remove(&id);

        match result {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(SessionError::Closed),
            Err(_) => Err(SessionError::Timeout),
        }
    }

    /// Sends one action request and checks the single-element reply.
    pub async fn send_action(
        &self,
        mime: &str,
        body: Option<&str>,
    ) -> Result<ActionReply, SessionError> {
        let reply = single_action_reply(&self.request(mime, body).await?)?;
        debug!(mime = %reply.mime, len = reply.text.len(), "action reply");
        Ok(reply)
    }

    /// Fetches the hub's activity and device configuration.
    pub async fn get_configuration(&self) -> Result<HubConfiguration, SessionError> {
        let reply = self.send_action(mime::CONFIG, None).await?;
        HubConfiguration::from_json(&reply.text).map_err(|e| ProtocolError::from(e).into())
    }

    /// Returns the id of the running activity (`-1` when everything is off).
    pub async fn get_current_activity(&self) -> Result<String, SessionError> {
        let reply = self.send_action(mime::CURRENT_ACTIVITY, None).await?;
        Ok(parse_current_activity(&reply.text).to_string())
    }

    /// Starts an activity by id.
    pub async fn start_activity(&self, activity_id: &str) -> Result<(), SessionError> {
        let body = start_activity_body(activity_id);
        self.send_action(mime::START_ACTIVITY, Some(&body)).await?;
        Ok(())
    }

    /// Presses a device button.
    pub async fn hold_action(&self, action: &ActionDescriptor) -> Result<(), SessionError> {
        let body = hold_action_body(action);
        self.send_action(mime::HOLD_ACTION, Some(&body)).await?;
        Ok(())
    }

    /// Closes the stream. The close tag is flushed, but the hub's reply is
    /// not awaited.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.write_handle.take() {
            let _ = tokio::time::timeout(self.timeouts.request, handle).await;
        }
        debug!("hub session closed");
    }
}

impl Drop for HubSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.read_handle.abort();
        if let Some(handle) = &self.write_handle {
            handle.abort();
        }
    }
}
