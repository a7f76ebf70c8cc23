//! Pose-landmark detection.
//!
//! The detector runtime is explicit about its lifecycle: [`LandmarkDetector::load`]
//! once per run, [`LandmarkDetector::detect`] per frame, then
//! [`LandmarkDetector::close`].

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use iterra_core::pose::Landmark;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::video::Raster;

/// Errors from a landmark detector.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("pose service error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),

    #[error("detector used before load()")]
    NotLoaded,
}

#[async_trait]
pub trait LandmarkDetector: Send {
    /// Initialize the model. Called once before the first detection.
    async fn load(&mut self) -> Result<(), DetectorError>;

    /// Landmarks of the primary subject in `frame`, or `None` when no
    /// subject was found.
    async fn detect(
        &mut self,
        frame: &Raster,
        timestamp_ms: u64,
    ) -> Result<Option<Vec<Landmark>>, DetectorError>;

    /// Release the model. Safe to call more than once.
    async fn close(&mut self) {}
}

// ---------------------------------------------------------------------------
// HTTP detector
// ---------------------------------------------------------------------------

/// Default address of the pose inference service.
pub const DEFAULT_DETECTOR_URL: &str = "http://127.0.0.1:8500";

/// Upper bound on a single call to the inference service.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    poses: Vec<DetectedPose>,
}

#[derive(Debug, Deserialize)]
struct DetectedPose {
    #[serde(default)]
    keypoints: Vec<Landmark>,
}

/// Client for a pose inference service.
///
/// The service exposes `GET /health` and `POST /detect`, the latter taking
/// a PNG frame and answering
/// `{"poses": [{"keypoints": [{"x", "y", "z"?, "score"?, "name"?}, ...]}]}`.
pub struct HttpPoseDetector {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    loaded: bool,
}

impl HttpPoseDetector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            loaded: false,
        }
    }

    /// Bound each health check and detection call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, DetectorError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DetectorError::ApiError {
            status: status.as_u16(),
            body,
        })
    }
}

fn encode_png(frame: &Raster) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    frame.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// First pose of a detection response, the primary subject.
fn primary_pose(response: DetectResponse) -> Option<Vec<Landmark>> {
    response
        .poses
        .into_iter()
        .next()
        .map(|pose| pose.keypoints)
        .filter(|keypoints| !keypoints.is_empty())
}

#[async_trait]
impl LandmarkDetector for HttpPoseDetector {
    async fn load(&mut self) -> Result<(), DetectorError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        self.loaded = true;
        tracing::info!(url = %self.base_url, "Pose detector ready");
        Ok(())
    }

    async fn detect(
        &mut self,
        frame: &Raster,
        timestamp_ms: u64,
    ) -> Result<Option<Vec<Landmark>>, DetectorError> {
        if !self.loaded {
            return Err(DetectorError::NotLoaded);
        }

        let body = encode_png(frame)?;
        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .query(&[("timestamp_ms", timestamp_ms)])
            .header(CONTENT_TYPE, "image/png")
            .timeout(self.request_timeout)
            .body(body)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let parsed: DetectResponse = response.json().await?;
        Ok(primary_pose(parsed))
    }

    async fn close(&mut self) {
        self.loaded = false;
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn first_pose_is_primary() {
        let response: DetectResponse = serde_json::from_value(serde_json::json!({
            "poses": [
                {"keypoints": [{"x": 0.1, "y": 0.2, "score": 0.9, "name": "nose"}]},
                {"keypoints": [{"x": 0.8, "y": 0.8}]}
            ]
        }))
        .unwrap();

        let landmarks = primary_pose(response).unwrap();
        assert_eq!(landmarks.len(), 1);
        assert_eq!((landmarks[0].x, landmarks[0].y, landmarks[0].visibility), (0.1, 0.2, 0.9));
        assert_eq!(landmarks[0].name.as_deref(), Some("nose"));
    }

    #[test]
    fn no_poses_is_a_miss() {
        let empty: DetectResponse = serde_json::from_value(serde_json::json!({ "poses": [] })).unwrap();
        assert_eq!(primary_pose(empty), None);

        let bare: DetectResponse =
            serde_json::from_value(serde_json::json!({ "poses": [{"keypoints": []}] })).unwrap();
        assert_eq!(primary_pose(bare), None);
    }

    #[test]
    fn frames_encode_as_png() {
        let bytes = encode_png(&Raster::new(3, 2)).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn base_url_is_normalized() {
        let detector = HttpPoseDetector::new("http://pose.local:8500/");
        assert_eq!(detector.base_url(), "http://pose.local:8500");
    }

    #[tokio::test]
    async fn detect_before_load_is_rejected() {
        let mut detector = HttpPoseDetector::new(DEFAULT_DETECTOR_URL);
        let err = detector.detect(&Raster::new(2, 2), 0).await.unwrap_err();
        assert_matches!(err, DetectorError::NotLoaded);
    }

    #[tokio::test]
    async fn hung_service_times_out() {
        use axum::routing::{get, post};

        let router = axum::Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/detect",
                post(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "{}"
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let mut detector =
            HttpPoseDetector::new(format!("http://{addr}")).with_timeout(Duration::from_millis(200));
        detector.load().await.unwrap();

        let started = std::time::Instant::now();
        let err = detector.detect(&Raster::new(2, 2), 0).await.unwrap_err();
        assert_matches!(err, DetectorError::Request(e) if e.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
