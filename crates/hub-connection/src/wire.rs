//! Incremental XMPP stanza reader.
//!
//! The stream is one long-lived XML document. The root `stream:stream`
//! element is reported as [`StreamEvent::Opened`]; each complete child of
//! the root is reported as a [`StreamEvent::Stanza`].

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tokio::io::{AsyncRead, BufReader};

use harmony_protocol::{Element, ProtocolError};

/// One unit read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The peer opened (or reopened) its stream; carries the root element
    /// without children.
    Opened(Element),
    /// A complete top-level stanza.
    Stanza(Element),
    /// The peer closed the stream or the socket hit EOF.
    Closed,
}

/// Reads stanzas off an async byte stream.
pub struct StanzaReader<R> {
    reader: Reader<BufReader<R>>,
    buf: Vec<u8>,
    stack: Vec<Element>,
    opened: bool,
}

impl<R: AsyncRead + Unpin> StanzaReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(BufReader::new(inner)),
            buf: Vec::with_capacity(4096),
            stack: Vec::new(),
            opened: false,
        }
    }

    /// Starts parsing a fresh document on the same byte stream, as required
    /// after SASL success. Bytes already buffered are kept.
    pub fn reset(self) -> Self {
        Self {
            reader: Reader::from_reader(self.reader.into_inner()),
            buf: self.buf,
            stack: Vec::new(),
            opened: false,
        }
    }

    /// Reads until the next complete event.
    pub async fn next(&mut self) -> Result<StreamEvent, ProtocolError> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into_async(&mut self.buf).await? {
                Event::Start(start) => {
                    let element = element_from(&start)?;
                    if !self.opened {
                        self.opened = true;
                        return Ok(StreamEvent::Opened(element));
                    }
                    self.stack.push(element);
                }
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    if let Some(stanza) = attach(&mut self.stack, element) {
                        return Ok(StreamEvent::Stanza(stanza));
                    }
                }
                Event::End(_) => match self.stack.pop() {
                    Some(element) => {
                        if let Some(stanza) = attach(&mut self.stack, element) {
                            return Ok(StreamEvent::Stanza(stanza));
                        }
                    }
                    None => return Ok(StreamEvent::Closed),
                },
                Event::Text(text) => {
                    if let Some(top) = self.stack.last_mut() {
                        top.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = self.stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => return Ok(StreamEvent::Closed),
                _ => {}
            }
        }
    }
}

/// Attaches a finished element to its parent, or returns it when it is a
/// top-level stanza.
fn attach(stack: &mut [Element], element: Element) -> Option<Element> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            None
        }
        None => Some(element),
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, ProtocolError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "<?xml version='1.0' encoding='iso-8859-1'?>\
        <stream:stream from='connect.logitech.com' id='abc' version='1.0' \
        xmlns='jabber:client' xmlns:stream='http://etherx.jabber.org/streams'>";

    #[tokio::test]
    async fn reads_header_then_stanzas() {
        let input = format!(
            "{HEADER}<stream:features><mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
             <mechanism>PLAIN</mechanism></mechanisms></stream:features>"
        );
        let mut reader = StanzaReader::new(input.as_bytes());

        let StreamEvent::Opened(root) = reader.next().await.unwrap() else {
            panic!("expected stream header");
        };
        assert_eq!(root.local_name(), "stream");
        assert_eq!(root.attr("id"), Some("abc"));

        let StreamEvent::Stanza(features) = reader.next().await.unwrap() else {
            panic!("expected features");
        };
        assert_eq!(features.name, "stream:features");
        let mechanism = features.child("mechanisms").unwrap().child("mechanism").unwrap();
        assert_eq!(mechanism.text, "PLAIN");

        assert_eq!(reader.next().await.unwrap(), StreamEvent::Closed);
    }

    #[tokio::test]
    async fn unescapes_action_text() {
        let input = format!(
            "{HEADER}<iq type='get' id='1'><oa xmlns='connect.logitech.com' errorcode='200'>\
             {{&quot;a&quot;:1}} &amp; more</oa></iq>"
        );
        let mut reader = StanzaReader::new(input.as_bytes());
        reader.next().await.unwrap();

        let StreamEvent::Stanza(iq) = reader.next().await.unwrap() else {
            panic!("expected iq");
        };
        assert_eq!(iq.children.len(), 1);
        assert_eq!(iq.children[0].text, r#"{"a":1} & more"#);
        assert_eq!(iq.children[0].attr("errorcode"), Some("200"));
    }

    #[tokio::test]
    async fn cdata_becomes_text() {
        let input = format!("{HEADER}<message><body><![CDATA[a<b]]></body></message>");
        let mut reader = StanzaReader::new(input.as_bytes());
        reader.next().await.unwrap();

        let StreamEvent::Stanza(msg) = reader.next().await.unwrap() else {
            panic!("expected message");
        };
        assert_eq!(msg.child("body").unwrap().text, "a<b");
    }

    #[tokio::test]
    async fn reset_reads_second_document() {
        let input = format!("{HEADER}<success xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>{HEADER}<stream:features/>");
        let mut reader = StanzaReader::new(input.as_bytes());
        assert!(matches!(reader.next().await.unwrap(), StreamEvent::Opened(_)));

        let StreamEvent::Stanza(success) = reader.next().await.unwrap() else {
            panic!("expected success");
        };
        assert_eq!(success.local_name(), "success");

        let mut reader = reader.reset();
        assert!(matches!(reader.next().await.unwrap(), StreamEvent::Opened(_)));
        let StreamEvent::Stanza(features) = reader.next().await.unwrap() else {
            panic!("expected features");
        };
        assert_eq!(features.local_name(), "features");
    }

    #[tokio::test]
    async fn stream_close_reported() {
        let input = format!("{HEADER}<presence/></stream:stream>");
        let mut reader = StanzaReader::new(input.as_bytes());
        reader.next().await.unwrap();
        assert!(matches!(reader.next().await.unwrap(), StreamEvent::Stanza(_)));
        assert_eq!(reader.next().await.unwrap(), StreamEvent::Closed);
    }
}
