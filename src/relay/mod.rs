/// Local HTTP relay
///
/// Exposes the two endpoints a browser front-end would call:
/// - `POST /api/upload`: multipart `file` field, inlined as a data URL
/// - `POST /api/transform-sketch`: `{ sketch }` forwarded to the backend
use bytes::Buf;
use futures::TryStreamExt;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::{Filter, Rejection, Reply};

use crate::state::data::SketchType;
use crate::transform::TransformClient;
use crate::error::UploadError;
use crate::upload::{self, UploadedFile, MAX_UPLOAD_BYTES};

/// Multipart bodies larger than this are cut off by warp before validation
const FORM_LIMIT_BYTES: u64 = 4 * MAX_UPLOAD_BYTES as u64;

/// Largest JSON body the transform endpoint reads
const SKETCH_LIMIT_BYTES: u64 = 32 * 1024 * 1024;

/// One file field read from a multipart form
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Read the first form field called `field`
pub async fn read_file_part(form: FormData, field: &str) -> Result<Option<FilePart>, warp::Error> {
    futures::pin_mut!(form);

    while let Some(part) = form.try_next().await? {
        if part.name() != field {
            continue;
        }

        let file_name = part.filename().map(str::to_owned);
        let content_type = part.content_type().map(str::to_owned);
        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(chunk.chunk());
                Ok(acc)
            })
            .await?;

        return Ok(Some(FilePart {
            file_name,
            content_type,
            bytes,
        }));
    }

    Ok(None)
}

#[derive(Debug, Deserialize)]
struct TransformBody {
    sketch: Option<String>,
    #[serde(default)]
    model_type: SketchType,
}

/// All relay routes; every answer, rejections included, is a JSON body
pub fn routes(
    client: TransformClient,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let upload = warp::post()
        .and(warp::path!("api" / "upload"))
        .and(warp::multipart::form().max_length(FORM_LIMIT_BYTES))
        .and_then(handle_upload)
        .recover(recover_upload);

    let transform = warp::post()
        .and(warp::path!("api" / "transform-sketch"))
        .and(warp::body::content_length_limit(SKETCH_LIMIT_BYTES))
        .and(warp::body::bytes())
        .and(warp::any().map(move || client.clone()))
        .and_then(handle_transform);

    upload.or(transform).recover(handle_rejection)
}

/// Serve the relay until the process exits
///
/// Fails up front when `addr` cannot be bound.
pub async fn serve(addr: SocketAddr, client: TransformClient) -> Result<(), warp::Error> {
    let backend = client.base_url().to_string();
    let wire = client.wire();

    let (bound, server) = warp::serve(routes(client)).try_bind_ephemeral(addr)?;
    info!(addr = %bound, %backend, ?wire, "relay listening");

    server.await;
    Ok(())
}

fn json_reply(status: StatusCode, body: serde_json::Value) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&body), status)
}

async fn handle_upload(form: FormData) -> Result<impl Reply, Infallible> {
    let file = match read_file_part(form, "file").await {
        Ok(Some(file)) => file,
        Ok(None) => {
            return Ok(json_reply(StatusCode::BAD_REQUEST, json!({ "error": "No file provided" })));
        }
        Err(e) => {
            error!("upload error: {}", e);
            return Ok(json_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to process upload", "details": e.to_string() }),
            ));
        }
    };

    let file_name = file.file_name.as_deref().unwrap_or("upload");
    match upload::accept(file_name, file.content_type.as_deref(), &file.bytes) {
        Ok(UploadedFile {
            file_url,
            file_name,
            file_size,
        }) => Ok(json_reply(
            StatusCode::OK,
            json!({
                "success": true,
                "fileUrl": file_url,
                "fileName": file_name,
                "fileSize": file_size,
            }),
        )),
        Err(e) => {
            let status = StatusCode::from_u16(e.status()).unwrap_or(StatusCode::BAD_REQUEST);
            Ok(json_reply(status, json!({ "error": e.to_string() })))
        }
    }
}

/// Oversized upload bodies are cut off before the form is read
async fn recover_upload(err: Rejection) -> Result<impl Reply, Rejection> {
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        warn!("upload body exceeds {} bytes", FORM_LIMIT_BYTES);
        return Ok(json_reply(
            StatusCode::BAD_REQUEST,
            json!({ "error": UploadError::TooLarge.to_string() }),
        ));
    }
    Err(err)
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::reject::MethodNotAllowed>() {
        (StatusCode::METHOD_NOT_ALLOWED, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::PayloadTooLarge>() {
        (StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::LengthRequired>() {
        (StatusCode::LENGTH_REQUIRED, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        error!("unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(json_reply(status, json!({ "error": message })))
}

async fn handle_transform(body: bytes::Bytes, client: TransformClient) -> Result<impl Reply, Infallible> {
    let request = match serde_json::from_slice::<TransformBody>(&body) {
        Ok(request) => request,
        Err(e) => {
            return Ok(json_reply(
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid request body", "details": e.to_string() }),
            ));
        }
    };

    let Some(sketch) = request.sketch.filter(|s| !s.is_empty()) else {
        return Ok(json_reply(StatusCode::BAD_REQUEST, json!({ "error": "No sketch provided" })));
    };

    match client.submit(&sketch, request.model_type).await {
        Ok(image) => {
            info!("successfully transformed sketch");
            Ok(json_reply(StatusCode::OK, json!({ "success": true, "image": image })))
        }
        Err(e) => Ok(json_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Failed to transform sketch", "details": e.to_string() }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::surface::Surface;
    use crate::transform::{client::DEFAULT_TIMEOUT, stub, WireFormat};

    const BOUNDARY: &str = "sketch-boundary";

    fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn offline_client() -> TransformClient {
        TransformClient::new("http://127.0.0.1:9", WireFormat::Json, DEFAULT_TIMEOUT).unwrap()
    }

    async fn post_upload(body: Vec<u8>) -> (StatusCode, serde_json::Value) {
        let response = warp::test::request()
            .method("POST")
            .path("/api/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(body)
            .reply(&routes(offline_client()))
            .await;

        let json = serde_json::from_slice(response.body()).unwrap();
        (response.status(), json)
    }

    async fn post_transform(client: TransformClient, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = warp::test::request()
            .method("POST")
            .path("/api/transform-sketch")
            .json(&body)
            .reply(&routes(client))
            .await;

        let json = serde_json::from_slice(response.body()).unwrap();
        (response.status(), json)
    }

    #[tokio::test]
    async fn test_upload_accepts_5mb_jpeg() {
        let data = vec![0x5A; 5 * 1024 * 1024];
        let (status, json) = post_upload(multipart_body("file", "photo.jpg", "image/jpeg", &data)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["fileName"], "photo.jpg");
        assert_eq!(json["fileSize"], data.len());
        assert!(json["fileUrl"].as_str().unwrap().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_upload_rejects_11mb_png() {
        let data = vec![0; 11 * 1024 * 1024];
        let (status, json) = post_upload(multipart_body("file", "huge.png", "image/png", &data)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "File size exceeds 10MB limit");
    }

    #[tokio::test]
    async fn test_upload_over_form_limit_gets_size_error() {
        let data = vec![0; 41 * 1024 * 1024];
        let (status, json) = post_upload(multipart_body("file", "poster.png", "image/png", &data)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "File size exceeds 10MB limit");
    }

    #[tokio::test]
    async fn test_upload_without_multipart_body_answers_json() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/upload")
            .header("content-type", "application/json")
            .body("{}")
            .reply(&routes(offline_client()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert!(json["error"].as_str().unwrap().contains("content-type"), "{json}");
    }

    #[tokio::test]
    async fn test_unknown_route_answers_json() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/nowhere")
            .reply(&routes(offline_client()))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(json["error"], "Not found");
    }

    #[tokio::test]
    async fn test_serve_fails_when_address_is_taken() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        assert!(serve(addr, offline_client()).await.is_err());
        drop(listener);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let (status, json) = post_upload(multipart_body("file", "notes.txt", "text/plain", b"hello")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "File must be an image");
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let (status, json) = post_upload(multipart_body("avatar", "a.png", "image/png", b"x")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No file provided");
    }

    #[tokio::test]
    async fn test_transform_requires_sketch() {
        let (status, json) = post_transform(offline_client(), json!({})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No sketch provided");
    }

    #[tokio::test]
    async fn test_transform_relays_backend_image() {
        let client = TransformClient::new(stub::json_echo(), WireFormat::Json, DEFAULT_TIMEOUT).unwrap();
        let sketch = Surface::new(8, 8).export_png().unwrap();

        let (status, json) = post_transform(client, json!({ "sketch": sketch, "model_type": "scene" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["image"], sketch);
    }

    #[tokio::test]
    async fn test_transform_wraps_backend_failure() {
        let backend = stub::status(503, json!({ "detail": "warming up" }));
        let client = TransformClient::new(backend, WireFormat::Json, DEFAULT_TIMEOUT).unwrap();

        let (status, json) = post_transform(client, json!({ "sketch": "data:image/png;base64,AA==" })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to transform sketch");
        let details = json["details"].as_str().unwrap();
        assert!(details.contains("503") && details.contains("warming up"), "{details}");
    }
}
