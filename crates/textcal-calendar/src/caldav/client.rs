//! WebDAV plumbing for the CalDAV store.
//!
//! Exactly the three verbs the store needs: PROPFIND for calendar
//! discovery, REPORT for time-range queries and PUT for object creation.
//! Every response status is mapped onto a [`StoreError`] code in one
//! place, so the store above only ever sees store errors.

use reqwest::{Client, Method, Response, StatusCode};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{StoreError, StoreResult};

use super::config::CalDavConfig;

/// User agent reported to the server.
const USER_AGENT: &str = concat!("textcal/", env!("CARGO_PKG_VERSION"));

/// HTTP client speaking the WebDAV subset of CalDAV.
#[derive(Debug)]
pub struct CalDavClient {
    http: Client,
    base: Url,
    /// Rendered `Authorization` value, attached preemptively.
    auth_header: Option<String>,
}

impl CalDavClient {
    /// Builds a client from the connection settings.
    pub fn new(config: CalDavConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                StoreError::configuration("failed to build the HTTP client").with_source(e)
            })?;

        if let Some(ref creds) = config.credentials {
            debug!(username = %creds.username(), "using basic auth");
        }

        Ok(Self {
            http,
            base: config.url,
            auth_header: config.credentials.map(|c| c.basic_header()),
        })
    }

    /// The configured base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// PROPFIND with `Depth: 1`, listing the children of a collection.
    pub async fn propfind(&self, url: &str, body: String) -> StoreResult<String> {
        self.dav_request("PROPFIND", url, body).await
    }

    /// calendar-query REPORT against a collection.
    pub async fn report(&self, url: &str, body: String) -> StoreResult<String> {
        self.dav_request("REPORT", url, body).await
    }

    /// Uploads a new calendar object.
    ///
    /// `If-None-Match: *` makes the PUT creation-only: the server answers
    /// 412 instead of overwriting an existing resource.
    pub async fn create_object(&self, url: &str, ics: String) -> StoreResult<()> {
        let mut request = self
            .http
            .put(url)
            .header("Content-Type", "text/calendar; charset=utf-8")
            .header("If-None-Match", "*")
            .body(ics);

        if let Some(ref header) = self.auth_header {
            request = request.header("Authorization", header.as_str());
        }

        trace!(url = %url, "PUT calendar object");

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::network("PUT request failed").with_source(e))?;

        read_body(response).await.map(|_| ())
    }

    async fn dav_request(&self, verb: &'static str, url: &str, body: String) -> StoreResult<String> {
        let method = Method::from_bytes(verb.as_bytes())
            .map_err(|_| StoreError::internal(format!("unsupported WebDAV verb {}", verb)))?;

        let mut request = self
            .http
            .request(method, url)
            .header("Depth", "1")
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(body);

        if let Some(ref header) = self.auth_header {
            request = request.header("Authorization", header.as_str());
        }

        trace!(verb = %verb, url = %url, "sending WebDAV request");

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::network(format!("{} request failed", verb)).with_source(e))?;

        read_body(response).await
    }
}

/// Extracts the body of a successful response, or maps the status.
async fn read_body(response: Response) -> StoreResult<String> {
    let status = response.status();
    trace!(status = %status, "received response");

    if status.is_success() {
        return response
            .text()
            .await
            .map_err(|e| StoreError::network("failed to read the response body").with_source(e));
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "server rejected the request");
    Err(status_error(status, &body))
}

/// Maps a non-success HTTP status onto a store error.
fn status_error(status: StatusCode, body: &str) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED => StoreError::authentication("server rejected the credentials"),
        StatusCode::FORBIDDEN => StoreError::access_denied("server refused calendar access"),
        StatusCode::NOT_FOUND => StoreError::not_found("calendar or resource not found"),
        StatusCode::PRECONDITION_FAILED => {
            StoreError::internal("an object with this identifier already exists")
        }
        StatusCode::TOO_MANY_REQUESTS => StoreError::server("server is rate limiting requests"),
        s if s.is_server_error() => StoreError::server(format!("server error ({}): {}", s, body)),
        s => StoreError::invalid_data(format!("unexpected status {}: {}", s, body)),
    }
}
