use std::time::Duration;
use tracing::{debug, error, info};

use super::wire::{self, TransformRequest, WireFormat};
use crate::config::Config;
use crate::error::TransformError;
use crate::state::data::SketchType;

/// Upper bound on a single transform request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the external image-generation backend
///
/// Stateless apart from its configuration: every `submit` is one
/// independent request that resolves exactly once. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct TransformClient {
    http: reqwest::Client,
    base_url: String,
    wire: WireFormat,
    timeout: Duration,
}

impl TransformClient {
    pub fn new(
        base_url: impl Into<String>,
        wire: WireFormat,
        timeout: Duration,
    ) -> Result<Self, TransformError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransformError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            wire,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TransformError> {
        Self::new(config.backend_url.clone(), config.wire, config.timeout())
    }

    pub fn wire(&self) -> WireFormat {
        self.wire
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a sketch to the backend and return the generated image as a data URL
    pub async fn submit(
        &self,
        image: &str,
        sketch_type: SketchType,
    ) -> Result<String, TransformError> {
        let request = TransformRequest::new(image, sketch_type);
        info!(
            backend = %self.base_url,
            wire = ?self.wire,
            %sketch_type,
            "submitting sketch for transform"
        );

        let result = self.send(&request).await;
        match &result {
            Ok(image) => debug!(bytes = image.len(), "transform succeeded"),
            Err(e) => error!(status = ?e.status(), "sketch transformation error: {}", e),
        }
        result
    }

    async fn send(&self, request: &TransformRequest) -> Result<String, TransformError> {
        let response = request
            .build(&self.http, &self.base_url, self.wire)?
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = wire::read_error_body(response).await;
            return Err(TransformError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let image = wire::read_image(response, self.wire)
            .await
            .map_err(|e| self.map_transport(e))?;

        if image.is_empty() {
            return Err(TransformError::NoImage);
        }
        Ok(image)
    }

    fn map_transport(&self, e: reqwest::Error) -> TransformError {
        if e.is_timeout() {
            TransformError::Timeout {
                after: self.timeout,
            }
        } else {
            TransformError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::surface::Surface;
    use crate::transform::stub;

    fn client(base_url: String, wire: WireFormat) -> TransformClient {
        TransformClient::new(base_url, wire, DEFAULT_TIMEOUT).unwrap()
    }

    fn blank_sketch() -> String {
        Surface::new(16, 16).export_png().unwrap()
    }

    #[tokio::test]
    async fn test_json_echo_returns_image() {
        let base = stub::json_echo();
        let sketch = blank_sketch();

        let image = client(base, WireFormat::Json)
            .submit(&sketch, SketchType::Object)
            .await
            .unwrap();

        assert_eq!(image, sketch);
    }

    #[tokio::test]
    async fn test_multipart_echo_round_trips_bytes() {
        let base = stub::multipart_echo();
        let sketch = blank_sketch();

        let image = client(base, WireFormat::Multipart)
            .submit(&sketch, SketchType::Scene)
            .await
            .unwrap();

        assert_eq!(image, sketch);
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let base = stub::status(500, serde_json::json!({ "detail": "model crashed" }));

        for wire in [WireFormat::Json, WireFormat::Multipart] {
            let err = client(base.clone(), wire)
                .submit(&blank_sketch(), SketchType::Object)
                .await
                .unwrap_err();

            assert_eq!(err.status(), Some(500));
            assert!(err.to_string().contains("model crashed"), "{err}");
        }
    }

    #[tokio::test]
    async fn test_missing_image_field_is_a_failure() {
        let base = stub::status(200, serde_json::json!({}));

        let err = client(base, WireFormat::Json)
            .submit(&blank_sketch(), SketchType::Object)
            .await
            .unwrap_err();

        assert_eq!(err, TransformError::NoImage);
        assert_eq!(err.to_string(), "no image returned");
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let base = stub::slow(Duration::from_secs(2));
        let client = TransformClient::new(base, WireFormat::Json, Duration::from_millis(200)).unwrap();

        let err = client
            .submit(&blank_sketch(), SketchType::Object)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TransformError::Timeout {
                after: Duration::from_millis(200)
            }
        );
        assert_eq!(err.to_string(), "request aborted: timed out after 200ms");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_network_failure() {
        // Port 9 (discard) is not expected to accept HTTP connections
        let err = client("http://127.0.0.1:9".into(), WireFormat::Json)
            .submit(&blank_sketch(), SketchType::Object)
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("request aborted"), "{err}");
    }
}
