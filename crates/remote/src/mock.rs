//! In-memory hub used by controller tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use harmony_auth::CredentialError;
use harmony_hub_connection::{PairingError, SessionError};
use harmony_protocol::{ActionDescriptor, HubConfiguration, LoginToken, SessionToken};

use crate::connector::{BoxFuture, HubConnector, HubLink};

pub(crate) const CONFIG: &str = r#"{
    "activity": [
        {"id": "-1", "label": "PowerOff"},
        {"id": "100", "label": "Watch TV"},
        {"id": "200", "label": "Listen to Music"}
    ],
    "device": [
        {
            "id": "1",
            "label": "Living Room TV",
            "controlGroup": [
                {"name": "Power", "function": [
                    {"name": "PowerOn", "label": "Power On", "action": {"deviceId": "1", "command": "PowerOn"}},
                    {"name": "PowerOff", "label": "Power Off", "action": {"deviceId": "1", "command": "PowerOff"}}
                ]},
                {"name": "Transport", "function": [
                    {"name": "Play", "label": "Play", "action": {"deviceId": "1", "command": "Play"}},
                    {"name": "Pause", "label": "Pause", "action": {"deviceId": "1", "command": "Pause"}}
                ]},
                {"name": "Inputs", "function": [
                    {"name": "InputHdmi1", "label": "HDMI 1", "action": {"deviceId": "1", "command": "InputHdmi1"}}
                ]}
            ]
        }
    ]
}"#;

/// Shared state of the fake hub, inspected by tests.
pub(crate) struct MockHub {
    pub config: HubConfiguration,
    pub current_activity: Mutex<String>,
    /// Number of upcoming session opens that fail.
    pub fail_opens: AtomicUsize,
    pub fail_exchange: AtomicBool,
    pub fail_requests: AtomicBool,
    pub op_delay: Duration,
    pub exchanges: AtomicUsize,
    pub swaps: AtomicUsize,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    /// Session tokens passed to `open_session`, in order.
    pub opened_with: Mutex<Vec<String>>,
    /// Order of `exchange`, `open` and `close` calls.
    pub lifecycle: Mutex<Vec<&'static str>>,
}

impl MockHub {
    pub fn new(config_json: &str, current_activity: &str) -> Arc<Self> {
        Arc::new(Self {
            config: HubConfiguration::from_json(config_json).unwrap(),
            current_activity: Mutex::new(current_activity.to_string()),
            fail_opens: AtomicUsize::new(0),
            fail_exchange: AtomicBool::new(false),
            fail_requests: AtomicBool::new(false),
            op_delay: Duration::ZERO,
            exchanges: AtomicUsize::new(0),
            swaps: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            opened_with: Mutex::new(Vec::new()),
            lifecycle: Mutex::new(Vec::new()),
        })
    }

    pub fn with_delay(config_json: &str, current_activity: &str, delay: Duration) -> Arc<Self> {
        let mut hub = Arc::into_inner(Self::new(config_json, current_activity)).unwrap();
        hub.op_delay = delay;
        Arc::new(hub)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lifecycle(&self) -> Vec<&'static str> {
        self.lifecycle.lock().unwrap().clone()
    }

    fn mark(&self, step: &'static str) {
        self.lifecycle.lock().unwrap().push(step);
    }

    fn record(&self, call: String) -> Result<(), SessionError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        Ok(())
    }
}

pub(crate) struct MockConnector(pub Arc<MockHub>);

struct MockLink {
    hub: Arc<MockHub>,
}

impl HubConnector for MockConnector {
    fn exchange_credentials(&self) -> BoxFuture<'_, Result<LoginToken, CredentialError>> {
        Box::pin(async move {
            self.0.mark("exchange");
            let n = self.0.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
            if self.0.fail_exchange.load(Ordering::SeqCst) {
                return Err(CredentialError::MissingToken);
            }
            Ok(LoginToken::new(format!("login-{n}")))
        })
    }

    fn swap_token<'a>(
        &'a self,
        login: &'a LoginToken,
    ) -> BoxFuture<'a, Result<SessionToken, PairingError>> {
        Box::pin(async move {
            self.0.swaps.fetch_add(1, Ordering::SeqCst);
            Ok(SessionToken::new(format!("session-for-{}", login.expose())))
        })
    }

    fn open_session<'a>(
        &'a self,
        token: &'a SessionToken,
    ) -> BoxFuture<'a, Result<Box<dyn HubLink>, SessionError>> {
        Box::pin(async move {
            self.0.mark("open");
            self.0.opens.fetch_add(1, Ordering::SeqCst);
            self.0.opened_with.lock().unwrap().push(token.expose().to_string());
            let failing = self.0.fail_opens.load(Ordering::SeqCst);
            if failing > 0 {
                self.0.fail_opens.store(failing - 1, Ordering::SeqCst);
                return Err(SessionError::Closed);
            }
            let active = self.0.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.0.max_active.fetch_max(active, Ordering::SeqCst);
            Ok(Box::new(MockLink { hub: self.0.clone() }) as Box<dyn HubLink>)
        })
    }
}

impl HubLink for MockLink {
    fn get_configuration(&self) -> BoxFuture<'_, Result<HubConfiguration, SessionError>> {
        Box::pin(async move {
            self.hub.record("config".into())?;
            Ok(self.hub.config.clone())
        })
    }

    fn get_current_activity(&self) -> BoxFuture<'_, Result<String, SessionError>> {
        Box::pin(async move {
            self.hub.record("current".into())?;
            Ok(self.hub.current_activity.lock().unwrap().clone())
        })
    }

    fn start_activity<'a>(&'a self, activity_id: &'a str) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async move {
            tokio::time::sleep(self.hub.op_delay).await;
            self.hub.record(format!("start:{activity_id}"))?;
            *self.hub.current_activity.lock().unwrap() = activity_id.to_string();
            Ok(())
        })
    }

    fn hold_action<'a>(
        &'a self,
        action: &'a ActionDescriptor,
    ) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async move {
            tokio::time::sleep(self.hub.op_delay).await;
            self.hub.record(format!("hold:{}:{}", action.device_id, action.command))
        })
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            self.hub.mark("close");
            self.hub.active.fetch_sub(1, Ordering::SeqCst);
            self.hub.closes.fetch_add(1, Ordering::SeqCst);
        })
    }
}
