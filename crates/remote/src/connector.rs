//! Seams between the controller and the network.
//!
//! [`HubConnector`] derives tokens and opens sessions; [`HubLink`] is one
//! open session. [`LiveConnector`] wires them to the Logitech cloud and a
//! real hub. Keeping them as traits lets the controller run against mocks.

use std::future::Future;
use std::pin::Pin;

use harmony_auth::{AuthClient, Credential, CredentialError};
use harmony_hub_connection::{HubSession, PairingError, SessionError, SessionTimeouts, swap_token};
use harmony_protocol::{ActionDescriptor, HubConfiguration, LoginToken, SessionToken};

/// Boxed future returned by the connector traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One open hub session.
pub trait HubLink: Send + Sync {
    fn get_configuration(&self) -> BoxFuture<'_, Result<HubConfiguration, SessionError>>;

    fn get_current_activity(&self) -> BoxFuture<'_, Result<String, SessionError>>;

    fn start_activity<'a>(&'a self, activity_id: &'a str) -> BoxFuture<'a, Result<(), SessionError>>;

    fn hold_action<'a>(
        &'a self,
        action: &'a ActionDescriptor,
    ) -> BoxFuture<'a, Result<(), SessionError>>;

    /// Ends the session without waiting for the hub's acknowledgment.
    fn close(self: Box<Self>) -> BoxFuture<'static, ()>;
}

/// Token derivation and session factory.
pub trait HubConnector: Send + Sync {
    /// Trades the account credentials for a login token.
    fn exchange_credentials(&self) -> BoxFuture<'_, Result<LoginToken, CredentialError>>;

    /// Trades a login token for a hub session token.
    fn swap_token<'a>(
        &'a self,
        login: &'a LoginToken,
    ) -> BoxFuture<'a, Result<SessionToken, PairingError>>;

    /// Opens an operating session.
    fn open_session<'a>(
        &'a self,
        token: &'a SessionToken,
    ) -> BoxFuture<'a, Result<Box<dyn HubLink>, SessionError>>;
}

impl HubLink for HubSession {
    fn get_configuration(&self) -> BoxFuture<'_, Result<HubConfiguration, SessionError>> {
        Box::pin(HubSession::get_configuration(self))
    }

    fn get_current_activity(&self) -> BoxFuture<'_, Result<String, SessionError>> {
        Box::pin(HubSession::get_current_activity(self))
    }

    fn start_activity<'a>(&'a self, activity_id: &'a str) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(HubSession::start_activity(self, activity_id))
    }

    fn hold_action<'a>(
        &'a self,
        action: &'a ActionDescriptor,
    ) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(HubSession::hold_action(self, action))
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, ()> {
        Box::pin(HubSession::close(*self))
    }
}

/// Connector backed by the Logitech cloud and a hub on the network.
pub struct LiveConnector {
    auth: AuthClient,
    credential: Credential,
    hub_addr: String,
    client_label: String,
    timeouts: SessionTimeouts,
}

impl LiveConnector {
    pub fn new(
        auth: AuthClient,
        credential: Credential,
        hub_addr: impl Into<String>,
        client_label: impl Into<String>,
        timeouts: SessionTimeouts,
    ) -> Self {
        Self {
            auth,
            credential,
            hub_addr: hub_addr.into(),
            client_label: client_label.into(),
            timeouts,
        }
    }
}

impl HubConnector for LiveConnector {
    fn exchange_credentials(&self) -> BoxFuture<'_, Result<LoginToken, CredentialError>> {
        Box::pin(self.auth.exchange(&self.credential))
    }

    fn swap_token<'a>(
        &'a self,
        login: &'a LoginToken,
    ) -> BoxFuture<'a, Result<SessionToken, PairingError>> {
        Box::pin(swap_token(
            &self.hub_addr,
            login,
            &self.client_label,
            self.timeouts,
        ))
    }

    fn open_session<'a>(
        &'a self,
        token: &'a SessionToken,
    ) -> BoxFuture<'a, Result<Box<dyn HubLink>, SessionError>> {
        Box::pin(async move {
            let session = HubSession::open(&self.hub_addr, token, self.timeouts).await?;
            Ok(Box::new(session) as Box<dyn HubLink>)
        })
    }
}
