use tracing::debug;

use crate::error::Error;
use crate::portal::client::PortalClient;
use crate::portal::models::{CaptureRequest, DataList, DataValue, SnapshotTemplate};

impl PortalClient {
    /// Search snapshot templates by name.
    ///
    /// `GET {prefix}/snapshot/getSnapshotTemplates.do?startIndex=0&endIndex=0&queryparam={name}`
    pub async fn search_snapshot_templates(&self, name: &str) -> Result<Vec<SnapshotTemplate>, Error> {
        let url = self.api_url_with_query(
            "/snapshot/getSnapshotTemplates.do",
            &[("startIndex", "0"), ("endIndex", "0"), ("queryparam", name)],
        )?;
        debug!(name, "searching snapshot templates");
        let resp: DataList<SnapshotTemplate> = self.get(url).await?;
        Ok(resp.data)
    }

    /// Capture a snapshot of every device in a container.
    ///
    /// `POST {prefix}/snapshot/captureContainerLevelSnapshot.do` with
    /// `{"templateId", "containerId"}`. Returns CVP's `data` string,
    /// `"success"` on acceptance.
    pub async fn capture_container_snapshot(
        &self,
        template_key: &str,
        container_key: &str,
    ) -> Result<String, Error> {
        let url = self.api_url("/snapshot/captureContainerLevelSnapshot.do")?;
        debug!(template_key, container_key, "capturing container snapshot");
        let body = CaptureRequest {
            template_id: template_key.to_owned(),
            container_id: container_key.to_owned(),
        };
        let resp: DataValue<serde_json::Value> = self.post(url, &body).await?;
        Ok(resp
            .data
            .as_str()
            .map_or_else(|| resp.data.to_string(), String::from))
    }
}
