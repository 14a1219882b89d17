// Portal authentication
//
// Cookie-based session login/logout and API prefix detection. The login
// endpoint sets a session cookie in the client's jar; subsequent requests
// use that cookie automatically.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::auth::ApiPrefix;
use crate::error::Error;
use crate::portal::client::{PortalClient, error_from_body};
use crate::transport::TransportConfig;

impl PortalClient {
    /// Authenticate with CVP using username/password.
    ///
    /// `POST {prefix}/login/authenticate.do` with `{"userId", "password"}`.
    /// CVP answers bad credentials with an error envelope, sometimes
    /// with HTTP 200, so both the status and the body are checked.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.base_url().join(&self.prefix().login_path())?;

        debug!("logging in at {}", url);

        let body = json!({
            "userId": username,
            "password": password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {text}"),
            });
        }
        if let Some(err) = error_from_body(&text) {
            return Err(Error::Authentication {
                message: err.to_string(),
            });
        }

        debug!("login successful");
        Ok(())
    }

    /// End the current session.
    ///
    /// `POST {prefix}/login/logout.do`
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.base_url().join(&self.prefix().logout_path())?;

        debug!("logging out at {}", url);

        let _resp = self
            .http()
            .post(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        debug!("logout complete");
        Ok(())
    }

    /// Auto-detect the API prefix by probing `getCvpInfo.do`.
    ///
    /// Releases that serve `/cvpservice` answer the probe (even with
    /// 401); older releases return 404 and are assumed to use `/web`.
    pub async fn detect_prefix(base_url: &Url, transport: &TransportConfig) -> Result<ApiPrefix, Error> {
        let http = transport.build_client()?;

        let probe = base_url.join(&ApiPrefix::CvpService.probe_path())?;
        debug!("probing {}", probe);

        let resp = http.get(probe).send().await.map_err(Error::Transport)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("detected legacy /web prefix");
            Ok(ApiPrefix::Web)
        } else {
            debug!("detected /cvpservice prefix");
            Ok(ApiPrefix::CvpService)
        }
    }
}
