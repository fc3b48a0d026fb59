//! XMPP stream negotiation: SASL PLAIN, stream restart, resource bind.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use harmony_protocol::Element;
use harmony_protocol::constants::XMPP_DOMAIN;
use harmony_protocol::stanza::{bind_request, sasl_plain, session_request, stream_header};

use crate::error::SessionError;
use crate::types::XmppIdentity;
use crate::wire::{StanzaReader, StreamEvent};

/// Runs the negotiation to completion and hands back the reader, ready
/// for application stanzas.
pub(crate) async fn negotiate<R, W>(
    reader: StanzaReader<R>,
    writer: &mut W,
    identity: &XmppIdentity,
) -> Result<StanzaReader<R>, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = reader;
    open_stream(&mut reader, writer).await?;

    send(writer, &sasl_plain(&identity.user, &identity.password).to_xml()).await?;
    let outcome = expect_stanza(&mut reader).await?;
    match outcome.local_name() {
        "success" => debug!(resource = %identity.resource, "SASL authentication succeeded"),
        "failure" => {
            let reason = outcome
                .children
                .first()
                .map_or("unspecified", |c| c.local_name());
            return Err(SessionError::Auth(reason.to_string()));
        }
        other => {
            return Err(SessionError::Negotiation(format!(
                "unexpected <{other}> in reply to auth"
            )));
        }
    }

    let mut reader = reader.reset();
    let features = open_stream(&mut reader, writer).await?;

    if features.child("bind").is_some() {
        let id = next_id();
        send(writer, &bind_request(&id, &identity.resource).to_xml()).await?;
        expect_result(&mut reader, &id, "bind").await?;
    }

    if features.child("session").is_some() {
        let id = next_id();
        send(writer, &session_request(&id).to_xml()).await?;
        expect_result(&mut reader, &id, "session").await?;
    }

    Ok(reader)
}

/// Sends our stream header and waits for the peer's header and features.
async fn open_stream<R, W>(
    reader: &mut StanzaReader<R>,
    writer: &mut W,
) -> Result<Element, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    send(writer, &stream_header(XMPP_DOMAIN)).await?;

    match reader.next().await? {
        StreamEvent::Opened(_) => {}
        StreamEvent::Stanza(el) => {
            return Err(SessionError::Negotiation(format!(
                "expected stream header, got <{}>",
                el.name
            )));
        }
        StreamEvent::Closed => return Err(SessionError::Closed),
    }

    let features = expect_stanza(reader).await?;
    if features.local_name() != "features" {
        return Err(SessionError::Negotiation(format!(
            "expected stream features, got <{}>",
            features.name
        )));
    }
    trace!(features = %features.to_xml(), "stream opened");
    Ok(features)
}

async fn expect_result<R>(
    reader: &mut StanzaReader<R>,
    id: &str,
    step: &str,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    let reply = expect_stanza(reader).await?;
    if reply.local_name() == "iq" && reply.attr("id") == Some(id) && reply.attr("type") == Some("result")
    {
        return Ok(());
    }
    Err(SessionError::Negotiation(format!(
        "{step} rejected: {}",
        reply.to_xml()
    )))
}

async fn expect_stanza<R>(reader: &mut StanzaReader<R>) -> Result<Element, SessionError>
where
    R: AsyncRead + Unpin,
{
    match reader.next().await? {
        StreamEvent::Stanza(el) => Ok(el),
        StreamEvent::Opened(_) => Err(SessionError::Negotiation(
            "unexpected stream header".into(),
        )),
        StreamEvent::Closed => Err(SessionError::Closed),
    }
}

pub(crate) async fn send<W: AsyncWrite + Unpin>(writer: &mut W, xml: &str) -> Result<(), SessionError> {
    trace!(bytes = xml.len(), "send");
    writer.write_all(xml.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

pub(crate) fn next_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
