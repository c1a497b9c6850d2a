//! HTTP boundary: upload endpoint, health check, static assets.

pub mod routes;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::Config;
use crate::pipeline::Pipeline;

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Mutex<Pipeline>>,
}

/// Build the application router
pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/classify", post(routes::classify))
        .route("/health", get(routes::health))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Bind and serve until the process is stopped
pub async fn serve(config: Config, pipeline: Arc<Mutex<Pipeline>>) -> anyhow::Result<()> {
    let state = AppState { pipeline };
    let app = router(state, &config);

    let addr = SocketAddr::from((config.host, config.port));
    info!("Emotion classifier listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::util::ServiceExt;

    const FELICIDAD_WINS: [f32; 7] = [0.05, 0.1, 0.02, 0.03, 0.6, 0.1, 0.1];
    const BOUNDARY: &str = "upload-test-boundary";

    fn canned_app(probabilities: Vec<f32>) -> (Router, Arc<AtomicUsize>, Arc<Mutex<Pipeline>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Arc::new(Mutex::new(Pipeline::with_canned_output(
            probabilities,
            calls.clone(),
        )));
        let state = AppState {
            pipeline: pipeline.clone(),
        };
        (router(state, &Config::default()), calls, pipeline)
    }

    fn multipart_upload(field: &str, filename: &str, payload: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/classify")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn encode_wav(samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_non_wav_upload_rejected_before_pipeline() {
        let (app, calls, _) = canned_app(FELICIDAD_WINS.to_vec());

        let response = app
            .oneshot(multipart_upload("file", "clip.mp3", b"not audio"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("WAV"));
        assert_eq!(
            calls.load(Ordering::SeqCst),
            0,
            "no pipeline stage may run for a rejected upload"
        );
    }

    #[tokio::test]
    async fn test_missing_file_field_rejected() {
        let (app, calls, _) = canned_app(FELICIDAD_WINS.to_vec());

        let response = app
            .oneshot(multipart_upload("attachment", "clip.wav", b"ignored"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("no audio file"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_wav_upload_classified() {
        let (app, calls, _) = canned_app(FELICIDAD_WINS.to_vec());
        let samples: Vec<i16> = (0..16000)
            .map(|i| ((i as f32 * 0.05).sin() * 8000.0) as i16)
            .collect();

        let response = app
            .oneshot(multipart_upload("file", "clip.wav", &encode_wav(&samples)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["category"], "Felicidad");
        assert_eq!(body["asset"], "static/emojis/felizAndres.gif");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreadable_wav_is_processing_failure() {
        let (app, calls, _) = canned_app(FELICIDAD_WINS.to_vec());

        let response = app
            .oneshot(multipart_upload("file", "clip.wav", b"RIFFbroken"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("unreadable"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_health_responds_while_classification_holds_the_lock() {
        let (app, _, pipeline) = canned_app(FELICIDAD_WINS.to_vec());

        // Simulate a classification in flight
        let _guard = pipeline.lock().unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["healthy"], true);
    }
}
