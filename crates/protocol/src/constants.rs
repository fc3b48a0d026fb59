use std::time::Duration;

/// TCP port of the hub's XMPP listener.
pub const HUB_PORT: u16 = 5222;

/// XMPP domain every hub identity lives under.
pub const XMPP_DOMAIN: &str = "connect.logitech.com";

/// Namespace of the `oa` action element.
pub const OA_NAMESPACE: &str = "connect.logitech.com";

/// Local part used while pairing, before a session token exists.
pub const GUEST_USER: &str = "guest";

/// Resource bound while pairing.
pub const PAIRING_RESOURCE: &str = "gatorade.";

/// Resource bound for regular sessions.
pub const SESSION_RESOURCE: &str = "gatorade";

/// Status code the hub puts in `errorcode` on success.
pub const SUCCESS_CODE: &str = "200";

/// Activity id the hub uses for "everything off".
pub const POWER_OFF_ACTIVITY_ID: &str = "-1";

/// Logitech cloud endpoint that turns account credentials into a login token.
pub const AUTH_URL: &str =
    "https://svcs.myharmony.com/CompositeSecurityServices/Security.svc/json/GetUserAuthToken";

/// Client label sent with the pairing request (`name#os#device`).
pub const DEFAULT_CLIENT_LABEL: &str = "harmony-bridge#iOS6.0.1#iPhone";

/// Time allowed for TCP connect plus the full XMPP negotiation.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time to wait for the reply to a single action request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine commands, sent as the `mime` attribute of an `oa` element.
pub mod mime {
    pub const PAIR: &str = "vnd.logitech.connect/vnd.logitech.pair";
    pub const CONFIG: &str = "vnd.logitech.harmony/vnd.logitech.harmony.engine?config";
    pub const CURRENT_ACTIVITY: &str =
        "vnd.logitech.harmony/vnd.logitech.harmony.engine?getCurrentActivity";
    pub const START_ACTIVITY: &str =
        "vnd.logitech.harmony/vnd.logitech.harmony.engine?startactivity";
    pub const HOLD_ACTION: &str = "vnd.logitech.harmony/vnd.logitech.harmony.engine?holdAction";
}

/// XMPP namespaces used during stream negotiation.
pub mod ns {
    pub const CLIENT: &str = "jabber:client";
    pub const STREAM: &str = "http://etherx.jabber.org/streams";
    pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";
    pub const BIND: &str = "urn:ietf:params:xml:ns:xmpp-bind";
    pub const SESSION: &str = "urn:ietf:params:xml:ns:xmpp-session";
}
