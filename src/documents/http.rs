use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{instrument, warn};

use super::{DocumentRenderer, PurchaseOrderSnapshot, RenderError, RenderedDocument};
use crate::config::RendererConfig;

/// Posts the snapshot to a rendering service and expects a PDF back
#[derive(Debug, Clone)]
pub struct HttpDocumentRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentRenderer {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RenderError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/purchase-order.pdf", self.base_url)
    }
}

#[async_trait]
impl DocumentRenderer for HttpDocumentRenderer {
    #[instrument(skip(self, snapshot), fields(purchase_order_id = %snapshot.purchase_order.purchase_order_id))]
    async fn render_purchase_order(
        &self,
        snapshot: &PurchaseOrderSnapshot,
    ) -> Result<RenderedDocument, RenderError> {
        let response = self
            .client
            .post(self.endpoint())
            .header(reqwest::header::ACCEPT_LANGUAGE, snapshot.locale.as_str())
            .json(snapshot)
            .send()
            .await
            .map_err(|e| RenderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "renderer rejected request");
            return Err(RenderError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Transport(e.to_string()))?;

        RenderedDocument {
            bytes,
            content_type,
        }
        .ensure_pdf()
    }
}
