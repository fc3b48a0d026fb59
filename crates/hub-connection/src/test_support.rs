//! Scripted in-process hub for session tests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::task::JoinHandle;

use harmony_protocol::Element;
use harmony_protocol::constants::{OA_NAMESPACE, ns};

use crate::wire::{StanzaReader, StreamEvent};

const SERVER_HEADER: &str = "<?xml version='1.0' encoding='iso-8859-1'?>\
    <stream:stream from='connect.logitech.com' id='fake' version='1.0' \
    xmlns='jabber:client' xmlns:stream='http://etherx.jabber.org/streams'>";

/// What the fake hub saw during one connection.
#[derive(Debug, Default)]
pub(crate) struct HubLog {
    pub auth: Option<(String, String)>,
    pub resource: Option<String>,
    /// `oa` elements of every action request, in arrival order.
    pub requests: Vec<Element>,
    pub closed: bool,
}

/// A hub that accepts one connection and answers action requests with
/// whatever the responder returns. `None` leaves the request unanswered.
pub(crate) struct FakeHub {
    pub addr: String,
    handle: JoinHandle<HubLog>,
}

impl FakeHub {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&Element) -> Option<String> + Send + Sync + 'static,
    {
        Self::spawn(Some(Box::new(respond))).await
    }

    /// A hub that fails SASL authentication.
    pub async fn start_rejecting() -> Self {
        Self::spawn(None).await
    }

    /// Waits for the connection to end and returns the log.
    pub async fn finish(self) -> HubLog {
        self.handle.await.unwrap()
    }

    async fn spawn(respond: Option<Box<dyn Fn(&Element) -> Option<String> + Send + Sync>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = tokio::spawn(async move {
            let mut log = HubLog::default();
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut reader = StanzaReader::new(read);

            expect_open(&mut reader).await;
            send(
                &mut write,
                &format!(
                    "{SERVER_HEADER}<stream:features><mechanisms xmlns='{}'>\
                     <mechanism>PLAIN</mechanism></mechanisms></stream:features>",
                    ns::SASL
                ),
            )
            .await;

            let auth = expect_stanza(&mut reader).await;
            let raw = STANDARD.decode(&auth.text).unwrap();
            let raw = String::from_utf8(raw).unwrap();
            let mut parts = raw.split('\0').skip(1);
            log.auth = Some((
                parts.next().unwrap_or_default().to_string(),
                parts.next().unwrap_or_default().to_string(),
            ));

            let Some(respond) = respond else {
                send(
                    &mut write,
                    &format!("<failure xmlns='{}'><not-authorized/></failure>", ns::SASL),
                )
                .await;
                return log;
            };
            send(&mut write, &format!("<success xmlns='{}'/>", ns::SASL)).await;

            let mut reader = reader.reset();
            expect_open(&mut reader).await;
            send(
                &mut write,
                &format!(
                    "{SERVER_HEADER}<stream:features><bind xmlns='{}'/>\
                     <session xmlns='{}'/></stream:features>",
                    ns::BIND,
                    ns::SESSION
                ),
            )
            .await;

            loop {
                let stanza = match reader.next().await {
                    Ok(StreamEvent::Stanza(stanza)) => stanza,
                    Ok(StreamEvent::Closed) => {
                        log.closed = true;
                        break;
                    }
                    _ => break,
                };
                let id = stanza.attr("id").unwrap_or_default().to_string();

                if let Some(bind) = stanza.child("bind") {
                    log.resource = bind.child("resource").map(|r| r.text.clone());
                    send(&mut write, &format!("<iq type='result' id='{id}'/>")).await;
                } else if stanza.child("session").is_some() {
                    send(&mut write, &format!("<iq type='result' id='{id}'/>")).await;
                } else if let Some(oa) = stanza.child("oa") {
                    log.requests.push(oa.clone());
                    if let Some(payload) = respond(oa) {
                        send(
                            &mut write,
                            &format!("<iq type='get' id='{id}' to='client'>{payload}</iq>"),
                        )
                        .await;
                    }
                }
            }
            log
        });

        Self { addr, handle }
    }
}

/// A successful `oa` reply carrying `text`.
pub(crate) fn ok_reply(text: &str) -> String {
    Element::new("oa")
        .with_attr("xmlns", OA_NAMESPACE)
        .with_attr("errorcode", "200")
        .with_attr("errorstring", "OK")
        .with_text(text)
        .to_xml()
}

async fn expect_open(reader: &mut StanzaReader<tokio::net::tcp::OwnedReadHalf>) {
    assert!(matches!(reader.next().await.unwrap(), StreamEvent::Opened(_)));
}

async fn expect_stanza(reader: &mut StanzaReader<tokio::net::tcp::OwnedReadHalf>) -> Element {
    match reader.next().await.unwrap() {
        StreamEvent::Stanza(el) => el,
        other => panic!("expected stanza, got {other:?}"),
    }
}

async fn send(write: &mut OwnedWriteHalf, xml: &str) {
    let _ = write.write_all(xml.as_bytes()).await;
}
