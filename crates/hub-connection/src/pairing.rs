//! Token swap: trades a cloud login token for a hub session token.

use tracing::{debug, warn};

use harmony_protocol::action::{pair_body, parse_pair_identity};
use harmony_protocol::constants::mime;
use harmony_protocol::stanza::single_action_reply;
use harmony_protocol::{LoginToken, SessionToken};

use crate::error::PairingError;
use crate::session::HubSession;
use crate::types::{SessionTimeouts, XmppIdentity};

/// Pairs with the hub as the guest identity and returns the session token
/// it hands out.
///
/// Any reply other than a single success element carrying
/// `identity=<id>:status` is a [`PairingError`]. The session is closed on
/// every path.
pub async fn swap_token(
    addr: &str,
    login: &LoginToken,
    client_label: &str,
    timeouts: SessionTimeouts,
) -> Result<SessionToken, PairingError> {
    let session = HubSession::open_as(addr, &XmppIdentity::pairing(login), timeouts).await?;

    let body = pair_body(login, client_label);
    let result = session.request(mime::PAIR, Some(&body)).await;
    session.close().await;

    let reply = single_action_reply(&result?).map_err(|e| {
        warn!("hub rejected pairing: {e}");
        PairingError::Reply(e)
    })?;

    let identity = parse_pair_identity(&reply.text)
        .ok_or_else(|| PairingError::MissingIdentity(reply.text.clone()))?;
    debug!("paired with hub");
    Ok(SessionToken::new(identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::SessionError;
    use crate::test_support::{FakeHub, ok_reply};

    fn timeouts() -> SessionTimeouts {
        SessionTimeouts {
            connect: Duration::from_secs(2),
            request: Duration::from_millis(300),
        }
    }

    #[tokio::test]
    async fn returns_identity_from_reply() {
        let hub = FakeHub::start(|oa| {
            (oa.attr("mime") == Some(mime::PAIR)).then(|| {
                ok_reply("serverIdentity=s:hubId=106:identity=7f3c0d1e-90ab:status=succeeded")
            })
        })
        .await;

        let token = swap_token(&hub.addr, &LoginToken::new("login-1"), "bridge#iOS6.0.1#iPhone", timeouts())
            .await
            .unwrap();
        assert_eq!(token.expose(), "7f3c0d1e-90ab");

        let log = hub.finish().await;
        assert_eq!(log.auth, Some(("guest".to_string(), "login-1".to_string())));
        assert_eq!(log.resource.as_deref(), Some("gatorade."));
        assert_eq!(log.requests[0].text, "token=login-1:name=bridge#iOS6.0.1#iPhone");
        assert!(log.closed);
    }

    #[tokio::test]
    async fn two_elements_is_pairing_error() {
        let hub = FakeHub::start(|_| {
            let one = ok_reply("identity=a:status=200");
            Some(format!("{one}{one}"))
        })
        .await;

        let err = swap_token(&hub.addr, &LoginToken::new("l"), "c", timeouts())
            .await
            .unwrap_err();
        assert!(matches!(err, PairingError::Reply(_)));
    }

    #[tokio::test]
    async fn non_success_code_is_pairing_error() {
        let hub = FakeHub::start(|_| {
            Some("<oa xmlns='connect.logitech.com' errorcode='401'>identity=a:status=401</oa>".into())
        })
        .await;

        let err = swap_token(&hub.addr, &LoginToken::new("l"), "c", timeouts())
            .await
            .unwrap_err();
        assert!(matches!(err, PairingError::Reply(_)));
    }

    #[tokio::test]
    async fn missing_identity_is_pairing_error() {
        let hub = FakeHub::start(|_| Some(ok_reply("status=succeeded"))).await;

        let err = swap_token(&hub.addr, &LoginToken::new("l"), "c", timeouts())
            .await
            .unwrap_err();
        assert!(matches!(err, PairingError::MissingIdentity(_)));
    }

    #[tokio::test]
    async fn silent_hub_is_timeout() {
        let hub = FakeHub::start(|_| None).await;

        let err = swap_token(&hub.addr, &LoginToken::new("l"), "c", timeouts())
            .await
            .unwrap_err();
        assert!(matches!(err, PairingError::Session(SessionError::Timeout)));
    }
}
