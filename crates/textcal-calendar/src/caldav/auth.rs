//! Preemptive HTTP Basic credentials (RFC 7617).
//!
//! The header value is rendered once at client construction and attached
//! to every request; there is no 401 challenge round trip.

use std::fmt;

use base64::Engine;

/// A username and password pair for a CalDAV account.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Renders the `Authorization` header value.
    pub fn basic_header(&self) -> String {
        let pair = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(pair)
        )
    }

    /// Returns the account username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

// The password must not leak into logs through configuration dumps.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
