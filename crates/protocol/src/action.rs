//! Text bodies of `oa` action requests and replies.
//!
//! The hub uses `key=value` pairs joined by `:`. Because `:` is the pair
//! separator, a colon inside a value is written doubled, which is why the
//! hold-action descriptor reads `"deviceId"::"…"`.

use crate::config::ActionDescriptor;
use crate::types::LoginToken;

/// Body of the pairing request.
pub fn pair_body(login: &LoginToken, client_label: &str) -> String {
    format!("token={}:name={client_label}", login.expose())
}

/// Body of a start-activity request.
pub fn start_activity_body(activity_id: &str) -> String {
    format!("activityId={activity_id}:timestamp=0")
}

/// Body of a hold-action request (a button press).
pub fn hold_action_body(action: &ActionDescriptor) -> String {
    format!(
        "action={{\"type\"::\"{}\",\"deviceId\"::\"{}\",\"command\"::\"{}\"}}:status=press:timestamp=0",
        action.kind, action.device_id, action.command,
    )
}

/// Extracts the session identity from a pairing reply
/// (`…identity=<id>:status=…`).
pub fn parse_pair_identity(reply: &str) -> Option<&str> {
    reply.match_indices("identity=").find_map(|(idx, key)| {
        let rest = &reply[idx + key.len()..];
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(rest.len());
        (end > 0 && rest[end..].starts_with(":status")).then(|| &rest[..end])
    })
}

/// Extracts the activity id from a current-activity reply (`result=<id>`).
pub fn parse_current_activity(reply: &str) -> &str {
    let reply = reply.trim();
    reply.strip_prefix("result=").unwrap_or(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_activity_body_golden() {
        assert_eq!(start_activity_body("42"), "activityId=42:timestamp=0");
        assert_eq!(start_activity_body("-1"), "activityId=-1:timestamp=0");
    }

    #[test]
    fn hold_action_body_golden() {
        let action = ActionDescriptor::ir_command("29611288", "Mute");
        assert_eq!(
            hold_action_body(&action),
            r#"action={"type"::"IRCommand","deviceId"::"29611288","command"::"Mute"}:status=press:timestamp=0"#
        );
    }

    #[test]
    fn pair_body_golden() {
        let token = LoginToken::new("dGVzdA==");
        assert_eq!(
            pair_body(&token, "foo#iOS6.0.1#iPhone"),
            "token=dGVzdA==:name=foo#iOS6.0.1#iPhone"
        );
    }

    #[test]
    fn pair_identity_extracted() {
        let reply = "serverIdentity=abc:hubId=106:identity=7f3c0d1e-90ab-4c2d-8e5f-1a2b3c4d5e6f:status=succeeded:protocolVersion={XMPP=\"1.0\"}";
        assert_eq!(
            parse_pair_identity(reply),
            Some("7f3c0d1e-90ab-4c2d-8e5f-1a2b3c4d5e6f")
        );
    }

    #[test]
    fn pair_identity_requires_status_suffix() {
        assert_eq!(parse_pair_identity("identity=abc"), None);
        assert_eq!(parse_pair_identity("identity=abc:hub=1"), None);
        assert_eq!(parse_pair_identity("identity=:status=200"), None);
        assert_eq!(parse_pair_identity("nothing here"), None);
    }

    #[test]
    fn pair_identity_skips_unmatched_occurrence() {
        let reply = "serverIdentity=x:y=1:identity=good-id:status=200";
        assert_eq!(parse_pair_identity(reply), Some("good-id"));
    }

    #[test]
    fn current_activity_strips_prefix() {
        assert_eq!(parse_current_activity("result=20157061"), "20157061");
        assert_eq!(parse_current_activity(" -1\n"), "-1");
    }
}
