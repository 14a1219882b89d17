// Portal API HTTP client
//
// Wraps `reqwest::Client` with CVP-specific URL construction, prefix
// handling, and error-envelope detection. Endpoint groups (configlets,
// inventory, containers, ...) are inherent methods in sibling files so
// this module stays focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::ApiPrefix;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the CloudVision Portal REST API.
///
/// Holds the session cookie after [`login`](Self::login). Every response
/// body is inspected for CVP's `{"errorCode", "errorMessage"}` envelope,
/// which the portal returns with HTTP 200 as often as not.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
    prefix: ApiPrefix,
    timeout_secs: u64,
}

impl PortalClient {
    /// Create a new portal client from a `TransportConfig`.
    ///
    /// A cookie jar is added when the config lacks one, since every call
    /// after login rides on the session cookie. `base_url` is the CVP
    /// root (e.g. `https://cvp.example.com`).
    pub fn new(base_url: Url, prefix: ApiPrefix, transport: &TransportConfig) -> Result<Self, Error> {
        let config = transport.for_portal();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            prefix,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    /// Create a portal client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, prefix: ApiPrefix) -> Self {
        Self {
            http,
            base_url,
            prefix,
            timeout_secs: 0,
        }
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The CVP base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The API prefix in use.
    pub fn prefix(&self) -> ApiPrefix {
        self.prefix
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}{prefix}{path}`, e.g. `https://cvp/cvpservice/inventory/getInventory.do`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}{}{path}", self.prefix.path());
        Ok(Url::parse(&full)?)
    }

    /// Like [`api_url`](Self::api_url) with URL-encoded query parameters appended.
    pub(crate) fn api_url_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Url, Error> {
        let mut url = self.api_url(path)?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the checked response body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(|e| self.map_send(e))?;

        self.parse_response(resp).await
    }

    /// Send a POST request with JSON body and decode the checked response body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send(e))?;

        self.parse_response(resp).await
    }

    fn map_send(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() && self.timeout_secs > 0 {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Check status and the CVP error envelope, then decode the body into `T`.
    async fn parse_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session expired or invalid credentials".into(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status = status.as_u16(), bytes = body.len(), "response received");

        if let Some(err) = error_from_body(&body) {
            return Err(err);
        }

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        decode(&body)
    }
}

/// Detect CVP's `{"errorCode": ..., "errorMessage": ...}` envelope.
///
/// `errorCode` arrives as a string on most releases and as a number on a
/// few; both are normalized to a string.
pub(crate) fn error_from_body(body: &str) -> Option<Error> {
    if !body.contains("errorCode") {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let code = match value.get("errorCode")? {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let message = value
        .get("errorMessage")
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| code.clone(), String::from);

    if message.contains("Unauthorized User") {
        return Some(Error::Authentication { message });
    }
    Some(Error::Api { code, message })
}

/// Decode a JSON body, keeping a preview of it in the error.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
