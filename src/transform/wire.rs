/// Wire shapes of a transform request
///
/// Both shapes carry the same logical request (sketch image + sketch type).
/// The rest of the app only sees [`TransformRequest`] and a data URL back.
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::raster::DataUrl;
use crate::state::data::SketchType;

/// Selects how requests are encoded for the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// `POST /transform-sketch` with `{ sketch }`, answered with `{ image }`
    Json,
    /// `POST /generate?model_type=..` with a `file` form part, answered with raw image bytes
    #[default]
    Multipart,
}

impl std::str::FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "multipart" => Ok(Self::Multipart),
            other => Err(format!("unknown wire format '{other}'")),
        }
    }
}

/// JSON body of the `json` shape
#[derive(Debug, Serialize)]
struct JsonRequest<'a> {
    sketch: &'a str,
    model_type: SketchType,
}

#[derive(Debug, Deserialize)]
struct JsonResponse {
    image: Option<String>,
}

/// One logical transform request
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    /// Sketch as a data URL
    pub image: String,
    pub sketch_type: SketchType,
}

impl TransformRequest {
    pub fn new(image: impl Into<String>, sketch_type: SketchType) -> Self {
        Self {
            image: image.into(),
            sketch_type,
        }
    }

    /// Build the HTTP request for `wire` against `base_url`
    pub fn build(
        &self,
        client: &Client,
        base_url: &str,
        wire: WireFormat,
    ) -> Result<RequestBuilder, TransformError> {
        if self.image.is_empty() {
            return Err(TransformError::InvalidPayload("empty sketch".into()));
        }
        let base_url = base_url.trim_end_matches('/');

        match wire {
            WireFormat::Json => Ok(client
                .post(format!("{base_url}/transform-sketch"))
                .json(&JsonRequest {
                    sketch: &self.image,
                    model_type: self.sketch_type,
                })),
            WireFormat::Multipart => {
                let decoded = DataUrl::parse(&self.image)
                    .map_err(|e| TransformError::InvalidPayload(e.to_string()))?;

                let part = Part::bytes(decoded.bytes)
                    .file_name("sketch.png")
                    .mime_str("image/png")
                    .map_err(|e| TransformError::InvalidPayload(e.to_string()))?;

                Ok(client
                    .post(format!("{base_url}/generate"))
                    .query(&[("model_type", self.sketch_type.as_str())])
                    .multipart(Form::new().part("file", part)))
            }
        }
    }
}

/// Turn a successful response into a data URL
pub async fn read_image(response: Response, wire: WireFormat) -> Result<String, reqwest::Error> {
    match wire {
        WireFormat::Json => {
            let text = response.text().await?;
            Ok(serde_json::from_str::<JsonResponse>(&text)
                .ok()
                .and_then(|body| body.image)
                .unwrap_or_default())
        }
        WireFormat::Multipart => {
            let mime = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.split(';').next().unwrap_or_default().trim().to_string())
                .filter(|value| value.starts_with("image/"))
                .unwrap_or_else(|| "image/png".to_string());

            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Ok(String::new());
            }
            Ok(DataUrl::encode(&mime, &bytes))
        }
    }
}

/// Reduce a failed response to the error body reported upstream
///
/// JSON bodies are kept verbatim; anything else becomes `{"error": <reason>}`.
pub async fn read_error_body(response: Response) -> String {
    let reason = response
        .status()
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => value.to_string(),
        Err(_) => serde_json::json!({ "error": reason }).to_string(),
    }
}
