//! Builders for the stanzas the bridge sends and validation of replies.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::constants::{OA_NAMESPACE, SUCCESS_CODE, ns};
use crate::element::Element;
use crate::error::ReplyError;

/// Closing tag of an XMPP stream.
pub const STREAM_CLOSE: &str = "</stream:stream>";

/// Opening header of a client-to-hub XMPP stream.
pub fn stream_header(domain: &str) -> String {
    format!(
        "<?xml version='1.0'?><stream:stream to='{domain}' version='1.0' xml:lang='en' \
         xmlns='{}' xmlns:stream='{}'>",
        ns::CLIENT,
        ns::STREAM
    )
}

/// SASL PLAIN auth element (`\0user\0password`, base64).
pub fn sasl_plain(user: &str, password: &str) -> Element {
    let raw = format!("\0{user}\0{password}");
    Element::new("auth")
        .with_attr("xmlns", ns::SASL)
        .with_attr("mechanism", "PLAIN")
        .with_text(STANDARD.encode(raw.as_bytes()))
}

/// Resource binding request.
pub fn bind_request(id: &str, resource: &str) -> Element {
    Element::new("iq")
        .with_attr("type", "set")
        .with_attr("id", id)
        .with_child(
            Element::new("bind")
                .with_attr("xmlns", ns::BIND)
                .with_child(Element::new("resource").with_text(resource)),
        )
}

/// Legacy session establishment request.
pub fn session_request(id: &str) -> Element {
    Element::new("iq")
        .with_attr("type", "set")
        .with_attr("id", id)
        .with_child(Element::new("session").with_attr("xmlns", ns::SESSION))
}

/// An `iq get` carrying a single `oa` action element.
pub fn action_request(id: &str, mime: &str, body: Option<&str>) -> Element {
    let mut oa = Element::new("oa")
        .with_attr("xmlns", OA_NAMESPACE)
        .with_attr("mime", mime);
    if let Some(body) = body {
        oa.text = body.to_string();
    }
    Element::new("iq")
        .with_attr("type", "get")
        .with_attr("id", id)
        .with_child(oa)
}

/// The single `oa` element of a successful reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReply {
    pub mime: String,
    pub text: String,
}

/// Checks that a reply `iq` holds exactly one payload element with a
/// success status and returns it.
pub fn single_action_reply(iq: &Element) -> Result<ActionReply, ReplyError> {
    if iq.attr("type") == Some("error") {
        let reason = iq
            .child("error")
            .and_then(|e| e.children.first())
            .map_or_else(|| "unspecified error".to_string(), |c| c.local_name().to_string());
        return Err(ReplyError::Rejected(reason));
    }

    let [payload] = iq.children.as_slice() else {
        return Err(ReplyError::ElementCount(iq.children.len()));
    };

    let code = payload.attr("errorcode").unwrap_or_default();
    let message = payload.attr("errorstring").unwrap_or_default();
    if code != SUCCESS_CODE {
        return Err(ReplyError::Status {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    Ok(ActionReply {
        mime: payload.attr("mime").unwrap_or_default().to_string(),
        text: payload.text.clone(),
    })
}
