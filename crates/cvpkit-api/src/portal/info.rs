use tracing::debug;

use crate::error::Error;
use crate::portal::client::PortalClient;
use crate::portal::models::CvpInfo;

impl PortalClient {
    /// Get CVP version information.
    ///
    /// `GET {prefix}/cvpInfo/getCvpInfo.do`
    ///
    /// Doubles as a connectivity check: it only succeeds with a live session.
    pub async fn cvp_info(&self) -> Result<CvpInfo, Error> {
        let url = self.api_url("/cvpInfo/getCvpInfo.do")?;
        debug!("fetching CVP info");
        self.get(url).await
    }
}
