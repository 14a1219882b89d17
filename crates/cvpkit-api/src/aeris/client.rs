// Analytics Engine HTTP client
//
// Every path answers `{"startState": {"updates": {...}}, ...}`. The client
// strips that envelope and hands back the `updates` object; walking the
// `_value` / `_ptr` structure inside it is left to the caller.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::aeris::paths::AERIS;
use crate::error::Error;
use crate::portal::client::{decode, error_from_body, preview};
use crate::transport::TransportConfig;

/// The `startState.updates` object of an Analytics Engine response.
pub type Updates = Map<String, Value>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateResponse {
    #[serde(default)]
    start_state: Option<StartState>,
}

#[derive(Debug, Default, Deserialize)]
struct StartState {
    #[serde(default)]
    updates: Updates,
}

/// Raw HTTP client for the Analytics Engine.
pub struct AerisClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AerisClient {
    /// Create a new client. `base_url` is the CVP root; the
    /// `/aeris/v1/rest` prefix is added per request. The timeout is
    /// raised to the Analytics Engine minimum.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.for_analytics().build_json_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Build `{base}/aeris/v1/rest[/{switch}[/{path}]]`.
    fn rest_url(&self, switch: Option<&str>, path: Option<&str>) -> Result<Url, Error> {
        let mut full = format!("{}{AERIS}", self.base_url.as_str().trim_end_matches('/'));
        if let Some(switch) = switch {
            full.push('/');
            full.push_str(switch);
        }
        if let Some(path) = path {
            full.push('/');
            full.push_str(path.trim_start_matches('/'));
        }
        Ok(Url::parse(&full)?)
    }

    async fn get_json(&self, url: Url) -> Result<String, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if let Some(err) = error_from_body(&body) {
            return Err(err);
        }
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }
        Ok(body)
    }

    /// List the serial numbers of every switch the Analytics Engine holds
    /// data for.
    ///
    /// `GET /aeris/v1/rest`
    ///
    /// The list is historical: a switch removed from the network stays
    /// in it for as long as its data is retained.
    pub async fn list_switches(&self) -> Result<Vec<String>, Error> {
        let url = self.rest_url(None, None)?;
        let body = self.get_json(url).await?;
        let root: Map<String, Value> = decode(&body)?;
        Ok(root.keys().cloned().collect())
    }

    /// Fetch the `startState.updates` object at `path` on `switch`.
    ///
    /// `GET /aeris/v1/rest/{switch}/{path}`
    ///
    /// A response without `startState` yields an empty map.
    pub async fn get_updates(&self, switch: &str, path: &str) -> Result<Updates, Error> {
        let url = self.rest_url(Some(switch), Some(path))?;
        let body = self.get_json(url).await?;
        let resp: StateResponse = decode(&body)?;
        Ok(resp.start_state.unwrap_or_default().updates)
    }
}
