// EOS eAPI client
//
// JSON-RPC 2.0 over HTTPS to `/command-api` on a switch, authenticated
// with HTTP basic auth. Used for checks that talk to a device directly
// rather than through CVP.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::portal::client::decode;
use crate::transport::TransportConfig;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Client for a single switch's command API.
pub struct EapiClient {
    http: reqwest::Client,
    endpoint: Url,
    username: String,
    password: SecretString,
}

impl EapiClient {
    /// Create a client for the switch reachable at `base_url`
    /// (e.g. `https://10.0.0.1`).
    pub fn new(
        base_url: &Url,
        username: &str,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, username, password)
    }

    /// Create a client for `host` over HTTPS.
    pub fn for_host(
        host: &str,
        username: &str,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base = Url::parse(&format!("https://{host}"))?;
        Self::new(&base, username, password, transport)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &Url,
        username: &str,
        password: SecretString,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: base_url.join("/command-api")?,
            username: username.to_owned(),
            password,
        })
    }

    /// Run commands in enable mode and return one JSON result per command.
    ///
    /// `POST /command-api` with a `runCmds` request (`version: 1`, `format: json`).
    pub async fn run_cmds(&self, cmds: &[&str]) -> Result<Vec<Value>, Error> {
        debug!("POST {} {:?}", self.endpoint, cmds);

        let body = json!({
            "jsonrpc": "2.0",
            "method": "runCmds",
            "params": { "version": 1, "cmds": cmds, "format": "json" },
            "id": "cvpkit",
        });

        let resp = self
            .http
            .post(self.endpoint.clone())
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("eAPI rejected credentials for {}", self.username),
            });
        }
        let text = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let rpc: RpcResponse = decode(&text)?;
        if let Some(err) = rpc.error {
            return Err(Error::Eapi {
                code: err.code,
                message: err.message,
            });
        }
        Ok(rpc.result.unwrap_or_default())
    }
}
