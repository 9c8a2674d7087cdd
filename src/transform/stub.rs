/// Stub generation backends for tests, served by warp on ephemeral ports
use std::collections::HashMap;
use std::time::Duration;
use warp::http::{Response, StatusCode};
use warp::Filter;

use crate::relay::read_file_part;

macro_rules! serve_stub {
    ($routes:expr) => {{
        let (addr, server) = warp::serve($routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}", addr)
    }};
}

/// Answers every POST with `code` and a JSON `body`
pub(crate) fn status(code: u16, body: serde_json::Value) -> String {
    let routes = warp::post().map(move || {
        warp::reply::with_status(
            warp::reply::json(&body),
            StatusCode::from_u16(code).expect("valid status code"),
        )
    });
    serve_stub!(routes)
}

/// `POST /transform-sketch` answering `{ image: <sketch> }`
pub(crate) fn json_echo() -> String {
    let routes = warp::post()
        .and(warp::path("transform-sketch"))
        .and(warp::body::json())
        .map(|body: serde_json::Value| warp::reply::json(&serde_json::json!({ "image": body["sketch"] })));
    serve_stub!(routes)
}

/// `POST /generate?model_type=..` answering with the uploaded file bytes
pub(crate) fn multipart_echo() -> String {
    let routes = warp::post()
        .and(warp::path("generate"))
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::multipart::form())
        .and_then(|query: HashMap<String, String>, form| async move {
            let file = read_file_part(form, "file").await.ok().flatten();
            let valid_type = matches!(query.get("model_type").map(String::as_str), Some("object" | "scene"));

            let response = match file {
                Some(file) if valid_type => Response::builder()
                    .header("content-type", "image/png")
                    .body(file.bytes),
                _ => Response::builder()
                    .status(StatusCode::UNPROCESSABLE_ENTITY)
                    .body(b"{\"detail\":\"bad request\"}".to_vec()),
            };
            Ok::<_, warp::Rejection>(response)
        });
    serve_stub!(routes)
}

/// Answers after `delay`, long enough to trip client timeouts
pub(crate) fn slow(delay: Duration) -> String {
    let routes = warp::post().and_then(move || async move {
        tokio::time::sleep(delay).await;
        Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!({ "image": "data:image/png;base64,AA==" })))
    });
    serve_stub!(routes)
}
