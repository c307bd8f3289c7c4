//! End-to-end tests of the HTTP surface with in-memory backends.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

use vitrine::{build_router, AppState};
use vitrine_core::credits::{CreditOutcome, CreditStore, TokenVerifier};
use vitrine_core::detection::ObjectDetector;
use vitrine_core::embedding::Embedder;
use vitrine_core::index::{Catalog, FlatIndex};
use vitrine_core::segmentation::{HumanParser, LabelMask};
use vitrine_core::{
    Backends, CatalogEntry, Config, CreditError, CreditGate, DetectedObject, PipelineResult,
    Vitrine,
};

const BOUNDARY: &str = "vitrine-test-boundary";
const SECRET: &str = "http-test-secret";

/// Images embed by mean colour, texts by keyword.
struct ColorEmbedder;

impl Embedder for ColorEmbedder {
    fn embed_image(&self, image: &DynamicImage) -> PipelineResult<Vec<f32>> {
        let rgb = image.to_rgb8();
        let n = (rgb.width() * rgb.height()) as f32;
        let mut sums = [0.0f32; 3];
        for px in rgb.pixels() {
            for c in 0..3 {
                sums[c] += px[c] as f32;
            }
        }
        Ok(sums.iter().map(|s| s / n).collect())
    }

    fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                if t.contains("red") {
                    vec![1.0, 0.0, 0.0]
                } else if t.contains("green") {
                    vec![0.0, 1.0, 0.0]
                } else {
                    vec![0.0, 0.0, 1.0]
                }
            })
            .collect())
    }
}

struct FixedDetector;

impl ObjectDetector for FixedDetector {
    fn detect(&self, _image: &DynamicImage, threshold: f32) -> PipelineResult<Vec<DetectedObject>> {
        Ok(vec![DetectedObject {
            label: "dress".to_string(),
            score: threshold.max(0.9),
            bbox: [1.0, 2.0, 3.0, 4.0],
        }])
    }
}

struct ConstParser(u8);

impl HumanParser for ConstParser {
    fn parse(&self, image: &DynamicImage) -> PipelineResult<LabelMask> {
        Ok(LabelMask::filled(image.width(), image.height(), self.0))
    }
}

/// Credit balances per user.
struct MemoryStore {
    balances: Mutex<HashMap<String, i64>>,
}

#[async_trait]
impl CreditStore for MemoryStore {
    async fn consume(&self, user_id: &str) -> Result<CreditOutcome, CreditError> {
        let mut balances = self.balances.lock().unwrap();
        match balances.get_mut(user_id) {
            None => Ok(CreditOutcome::UnknownUser),
            Some(0) => Ok(CreditOutcome::Exhausted),
            Some(credits) => {
                *credits -= 1;
                Ok(CreditOutcome::Consumed { remaining: *credits })
            }
        }
    }
}

/// A profile store that is always unreachable.
struct OfflineStore;

#[async_trait]
impl CreditStore for OfflineStore {
    async fn consume(&self, _user_id: &str) -> Result<CreditOutcome, CreditError> {
        Err(CreditError::Upstream("connection refused".into()))
    }
}

fn vitrine() -> Arc<Vitrine> {
    vitrine_with(Config::default())
}

fn vitrine_with(config: Config) -> Arc<Vitrine> {
    let catalog = Catalog::new(vec![
        CatalogEntry {
            label: "red dress".into(),
            image_path: "images/red.jpg".into(),
        },
        CatalogEntry {
            label: "green coat".into(),
            image_path: "images/green.jpg".into(),
        },
        CatalogEntry {
            label: "blue jeans".into(),
            image_path: "images/blue.jpg".into(),
        },
    ]);
    let index = FlatIndex::from_rows(&[
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0],
    ])
    .unwrap();

    let backends = Backends {
        embedder: Arc::new(ColorEmbedder),
        index: Arc::new(index),
        catalog: Arc::new(catalog),
        detector: Arc::new(FixedDetector),
        atr: Arc::new(ConstParser(4)),
        lip: Arc::new(ConstParser(5)),
    };
    Arc::new(Vitrine::from_parts(config, backends).unwrap())
}

fn app() -> Router {
    build_router(AppState::new(vitrine(), None))
}

fn gated_app(balances: &[(&str, i64)]) -> Router {
    let store = MemoryStore {
        balances: Mutex::new(
            balances
                .iter()
                .map(|(user, credits)| (user.to_string(), *credits))
                .collect(),
        ),
    };
    gated_app_with(Arc::new(store))
}

fn gated_app_with(store: Arc<dyn CreditStore>) -> Router {
    let gate = CreditGate::new(TokenVerifier::new(SECRET, "authenticated"), store);
    build_router(AppState::new(vitrine(), Some(Arc::new(gate))))
}

fn bearer(sub: &str) -> String {
    let claims = serde_json::json!({
        "sub": sub,
        "aud": "authenticated",
        "exp": 4_102_444_800u64,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

fn png(color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 6, Rgb(color)));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// A multipart body with optional image bytes and text fields.
fn multipart(image: Option<&[u8]>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"upload.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn post(uri: &str, body: Vec<u8>, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_reports_catalog() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["catalog_size"], 3);
    assert_eq!(json["credits_enabled"], false);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_search_by_image_ranks_matching_item_first() {
    let body = multipart(Some(&png([200, 0, 0])), &[("top_k", "2")]);
    let (status, json) = send(app(), post("/api/v1/search/", body, None)).await;

    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["label"], "red dress");
    assert_eq!(results[0]["image_path"], "images/red.jpg");
}

#[tokio::test]
async fn test_search_by_text_without_trailing_slash() {
    let body = multipart(None, &[("text", "a green coat"), ("top_k", "1")]);
    let (status, json) = send(app(), post("/api/v1/search", body, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["label"], "green coat");
}

#[tokio::test]
async fn test_search_without_inputs_is_empty() {
    let body = multipart(None, &[("text", "   ")]);
    let (status, json) = send(app(), post("/api/v1/search/", body, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_rejects_out_of_range_alpha() {
    let body = multipart(None, &[("text", "red"), ("alpha", "1.5")]);
    let (status, json) = send(app(), post("/api/v1/search/", body, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_search_accepts_top_k_above_catalog_size() {
    let body = multipart(None, &[("text", "red"), ("top_k", "150")]);
    let (status, json) = send(app(), post("/api/v1/search/", body, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let body = multipart(Some(b"definitely not an image"), &[]);
    let (status, json) = send(app(), post("/api/v1/detect/", body, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "NOT_AN_IMAGE");
}

#[tokio::test]
async fn test_segment_rejects_non_image_upload() {
    let body = multipart(Some(b"plain text, not pixels"), &[]);
    let (status, json) = send(app(), post("/api/v1/segment/", body, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "NOT_AN_IMAGE");
}

#[tokio::test]
async fn test_truncated_png_is_decode_failure() {
    let mut bytes = png([10, 10, 10]);
    bytes.truncate(40);
    let body = multipart(Some(&bytes), &[]);
    let (status, json) = send(app(), post("/api/v1/detect/", body, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "DECODE_FAILED");
}

#[tokio::test]
async fn test_classify_returns_distribution() {
    let body = multipart(Some(&png([0, 180, 0])), &[("labels", "red, green, , blue")]);
    let (status, json) = send(app(), post("/api/v1/classify/", body, None)).await;

    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["label"], "green");
    let total: f64 = results.iter().map(|r| r["score"].as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_classify_requires_labels() {
    let body = multipart(Some(&png([0, 0, 0])), &[("labels", " , ")]);
    let (status, _) = send(app(), post("/api/v1/classify/", body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = multipart(None, &[("labels", "shirt")]);
    let (status, _) = send(app(), post("/api/v1/classify/", body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detect_returns_objects() {
    let body = multipart(Some(&png([10, 10, 10])), &[]);
    let (status, json) = send(app(), post("/api/v1/detect/", body, None)).await;

    assert_eq!(status, StatusCode::OK);
    let objects = json["detected_objects"].as_array().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["label"], "dress");
    assert_eq!(objects[0]["box"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_segment_reports_both_taxonomies() {
    let body = multipart(Some(&png([10, 10, 10])), &[]);
    let (status, json) = send(app(), post("/api/v1/segment/", body, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["detected_labels_atr"][0], "Upper-clothes");
    assert_eq!(json["detected_labels_lip"][0], "Upper-clothes");
    assert!(json["color_map_atr"]["Upper-clothes"].is_string());

    let png_bytes = STANDARD
        .decode(json["mask_color_lip_base64"].as_str().unwrap())
        .unwrap();
    let mask = image::load_from_memory(&png_bytes).unwrap();
    assert_eq!((mask.width(), mask.height()), (8, 6));
}

#[tokio::test]
async fn test_static_serves_catalog_images() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("images")).unwrap();
    std::fs::write(dir.path().join("images/red.jpg"), png([200, 0, 0])).unwrap();

    let mut config = Config::default();
    config.general.data_dir = dir.path().to_path_buf();
    let app = build_router(AppState::new(vitrine_with(config), None));

    let request = Request::builder()
        .uri("/static/images/red.jpg")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_gate_requires_token() {
    let body = multipart(None, &[("text", "red")]);
    let (status, json) = send(gated_app(&[]), post("/api/v1/search/", body, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_gate_spends_credits_until_exhausted() {
    let app = gated_app(&[("user-1", 1)]);
    let auth = bearer("user-1");

    let body = multipart(None, &[("text", "red")]);
    let (status, _) = send(app.clone(), post("/api/v1/search/", body, Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);

    let body = multipart(None, &[("text", "red")]);
    let (status, json) = send(app, post("/api/v1/search/", body, Some(&auth))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["error"]["code"], "CREDITS_EXHAUSTED");
}

#[tokio::test]
async fn test_gate_rejects_unknown_user_and_leaves_health_open() {
    let app = gated_app(&[]);

    let body = multipart(None, &[("text", "red")]);
    let auth = bearer("ghost");
    let (status, _) = send(app.clone(), post("/api/v1/search/", body, Some(&auth))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["credits_enabled"], true);
}

#[tokio::test]
async fn test_gate_rejects_invalid_token() {
    let body = multipart(None, &[("text", "red")]);
    let request = post("/api/v1/search/", body, Some("Bearer not.a.jwt"));
    let (status, json) = send(gated_app(&[("user-1", 5)]), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_gate_store_failure_is_server_error() {
    let body = multipart(None, &[("text", "red")]);
    let auth = bearer("user-1");
    let app = gated_app_with(Arc::new(OfflineStore));
    let (status, json) = send(app, post("/api/v1/search/", body, Some(&auth))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "CREDIT_STORE_ERROR");
}

#[tokio::test]
async fn test_gate_does_not_charge_failed_requests() {
    let app = gated_app(&[("user-1", 1)]);
    let auth = bearer("user-1");

    let body = multipart(Some(b"not an image"), &[]);
    let (status, json) = send(app.clone(), post("/api/v1/segment/", body, Some(&auth))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "NOT_AN_IMAGE");

    let body = multipart(Some(&png([10, 10, 10])), &[]);
    let (status, _) = send(app.clone(), post("/api/v1/segment/", body, Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);

    let body = multipart(Some(&png([10, 10, 10])), &[]);
    let (status, json) = send(app, post("/api/v1/segment/", body, Some(&auth))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["error"]["code"], "CREDITS_EXHAUSTED");
}
