// HTTP client construction shared by the three CVP surfaces.
//
// The portal rides on a session cookie, the Analytics Engine on JSON
// headers and a longer timeout, eAPI on basic auth per request. TLS and
// timeout settings come from one `TransportConfig` either way.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::error::Error;

/// Analytics Engine walks return whole Sysdb subtrees; never time out
/// sooner than this.
pub const ANALYTICS_MIN_TIMEOUT: Duration = Duration::from_secs(60);

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone)]
pub enum TlsMode {
    System,
    /// PEM file with the cluster's CA.
    CustomCa(PathBuf),
    /// CVP and EOS ship with self-signed certificates.
    DangerAcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Same settings with a session cookie jar, reusing an existing one.
    pub fn for_portal(&self) -> Self {
        let mut config = self.clone();
        if config.cookie_jar.is_none() {
            config.cookie_jar = Some(Arc::new(Jar::default()));
        }
        config
    }

    /// Same TLS settings, no cookies, timeout raised to
    /// [`ANALYTICS_MIN_TIMEOUT`].
    pub fn for_analytics(&self) -> Self {
        Self {
            tls: self.tls.clone(),
            timeout: self.timeout.max(ANALYTICS_MIN_TIMEOUT),
            cookie_jar: None,
        }
    }

    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Client that sends and accepts JSON on every request.
    pub fn build_json_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.build_client_with_headers(headers)
    }

    fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("cvpkit/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => {
                let pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("cannot read CA file {}: {e}", path.display())))?;
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| Error::Tls(format!("{} is not a PEM certificate: {e}", path.display())))?;
                builder.add_root_certificate(cert)
            }
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        if let Some(jar) = &self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("HTTP client setup failed: {e}")))
    }
}
