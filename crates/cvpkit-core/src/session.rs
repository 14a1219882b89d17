// ── CVP session ──
//
// Login lifecycle for the portal API. Every operation takes a connected
// `Cvp`; the Analytics Engine client shares its transport settings but
// needs no login.

use cvpkit_api::{AerisClient, CvpInfo, PortalClient};
use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, PrefixSelection, RetryPolicy};
use crate::error::CoreError;

/// An authenticated portal session.
pub struct Cvp {
    config: ConnectionConfig,
    portal: PortalClient,
    info: CvpInfo,
}

impl Cvp {
    /// Resolve the API prefix, log in, and confirm the cluster answers
    /// with a version.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, CoreError> {
        let transport = config.transport();

        let prefix = match config.prefix {
            PrefixSelection::Fixed(prefix) => prefix,
            PrefixSelection::Auto => PortalClient::detect_prefix(&config.url, &transport).await?,
        };
        debug!(%prefix, "using API prefix");

        let portal = PortalClient::new(config.url.clone(), prefix, &transport)?;
        portal
            .login(&config.auth.username, &config.auth.password)
            .await?;

        let info = portal.cvp_info().await?;
        if info.version.is_empty() {
            return Err(CoreError::ConnectionFailed {
                url: config.url.to_string(),
                reason: "CVP did not report a version".into(),
            });
        }
        info!(server = %config.server_name(), version = %info.version, "connected to CVP");

        Ok(Self {
            config,
            portal,
            info,
        })
    }

    /// Keep calling [`connect`](Self::connect) until it succeeds, sleeping
    /// `policy.delay` between attempts.
    ///
    /// Bad credentials are not retried.
    pub async fn connect_with_retry(
        config: ConnectionConfig,
        policy: RetryPolicy,
    ) -> Result<Self, CoreError> {
        let mut attempts: u32 = 0;
        loop {
            match Self::connect(config.clone()).await {
                Ok(cvp) => return Ok(cvp),
                Err(e @ CoreError::AuthenticationFailed { .. }) => return Err(e),
                Err(e) => {
                    attempts += 1;
                    if policy.max_attempts.is_some_and(|max| attempts >= max) {
                        return Err(e);
                    }
                    warn!(
                        attempt = attempts,
                        error = %e,
                        "cannot connect to CVP, waiting {}s",
                        policy.delay.as_secs()
                    );
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    /// Log out. Failures are logged and otherwise ignored.
    pub async fn disconnect(&self) {
        if let Err(e) = self.portal.logout().await {
            debug!(error = %e, "logout failed");
        }
    }

    pub fn portal(&self) -> &PortalClient {
        &self.portal
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Version and build information reported at login.
    pub fn info(&self) -> &CvpInfo {
        &self.info
    }

    /// Build an Analytics Engine client for the same cluster.
    pub fn aeris(&self) -> Result<AerisClient, CoreError> {
        Ok(AerisClient::new(
            self.config.url.clone(),
            &self.config.transport(),
        )?)
    }
}
