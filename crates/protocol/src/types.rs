use std::fmt;

/// Short-lived token issued by the Logitech cloud for an account.
///
/// Only useful as the credential of a pairing request to the hub.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginToken(String);

/// Hub-scoped token obtained by pairing with a [`LoginToken`].
///
/// Used as both the XMPP user and password of a hub session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

macro_rules! opaque_token {
    ($ty:ident) => {
        impl $ty {
            /// Wraps a raw token value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the raw token value.
            pub fn expose(&self) -> &str {
                &self.0
            }
        }

        // Debug output keeps only a four-character prefix.
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let prefix: String = self.0.chars().take(4).collect();
                write!(f, concat!(stringify!($ty), "({}…)"), prefix)
            }
        }
    };
}

opaque_token!(LoginToken);
opaque_token!(SessionToken);
