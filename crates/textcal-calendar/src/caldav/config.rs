//! Connection settings for the CalDAV store.

use std::time::Duration;

use url::Url;

use super::auth::Credentials;

/// Where and how to reach the CalDAV server.
///
/// The URL may point at a principal home (discovery finds the calendar
/// collections underneath) or directly at a single calendar collection.
#[derive(Debug, Clone)]
pub struct CalDavConfig {
    /// Base URL of the server.
    pub url: Url,

    /// Account credentials, absent for servers that allow anonymous access.
    pub credentials: Option<Credentials>,

    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl CalDavConfig {
    /// Timeout applied when the caller does not override it.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a configuration for the given server URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse.
    pub fn new(url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(url.as_ref())?,
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Sets the account credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_server_url() {
        let config = CalDavConfig::new("https://dav.example.com/calendars/alice/").unwrap();
        assert_eq!(
            config.url.as_str(),
            "https://dav.example.com/calendars/alice/"
        );
        assert!(config.credentials.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_a_malformed_url() {
        assert!(CalDavConfig::new("not a valid url").is_err());
    }

    #[test]
    fn builders_set_credentials_and_timeout() {
        let config = CalDavConfig::new("https://dav.example.com/")
            .unwrap()
            .with_credentials("alice", "secret")
            .with_timeout(Duration::from_secs(5));

        let creds = config.credentials.as_ref().unwrap();
        assert_eq!(creds.username(), "alice");
        assert_eq!(creds.basic_header(), "Basic YWxpY2U6c2VjcmV0");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
