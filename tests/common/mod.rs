//! In-process fake of the Gemini and Pinecone REST APIs
#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::Hash;
use std::hash::Hasher;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use axum::Router;
use serde_json::json;
use serde_json::Value;
use teachrag::config::AppConfig;
use teachrag::config::ServiceMode;

pub const GEMINI_KEY: &str = "test-gemini-key";
pub const PINECONE_KEY: &str = "test-pinecone-key";
pub const FAKE_ANSWER: &str = "Photosynthesis turns light into chemical energy.";
pub const DIMENSION: usize = 768;

#[derive(Debug, Clone)]
pub struct FakeVector {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Value,
}

#[derive(Debug, Clone)]
pub struct FakeIndex {
    pub dimension: usize,
    pub metric: String,
    pub cloud: String,
    pub region: String,
    pub ready: bool,
    pub vectors: Vec<FakeVector>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub indexes: BTreeMap<String, FakeIndex>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub create_calls: usize,
    pub upsert_calls: usize,
    pub generate_requests: Vec<Value>,
}

#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<FakeState>>,
    base_url: String,
}

/// Running fake server
pub struct FakeApis {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeApis {
    pub async fn start() -> Self {
        let _ = teachrag::logging::init_simple_logging();
        let state = Arc::new(Mutex::new(FakeState::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new().fallback(dispatch).with_state(Shared {
            state: state.clone(),
            base_url: format!("http://{addr}"),
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Live-mode configuration pointing every client at this server
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.server.mode = ServiceMode::Live;
        config.server.request_timeout_secs = 10;
        config.embeddings.endpoint = self.base_url();
        config.embeddings.api_key = Some(GEMINI_KEY.to_string());
        config.llm.endpoint = self.base_url();
        config.llm.api_key = Some(GEMINI_KEY.to_string());
        config.pinecone.api_key = Some(PINECONE_KEY.to_string());
        config.pinecone.control_endpoint = self.base_url();
        config.pinecone.ready_timeout_secs = 5;
        config
    }

    pub fn serve_file(&self, name: &str, bytes: &[u8]) -> String {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(name.to_string(), bytes.to_vec());
        format!("{}/files/{}", self.base_url(), name)
    }

    pub fn index(&self, name: &str) -> Option<FakeIndex> {
        self.state.lock().unwrap().indexes.get(name).cloned()
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn last_generate_request(&self) -> Option<Value> {
        self.state.lock().unwrap().generate_requests.last().cloned()
    }
}

/// Bag-of-words embedding: similar wording gives similar vectors
pub fn fake_embedding(text: &str) -> Vec<f32> {
    let mut values = vec![0.0_f32; DIMENSION];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hasher = DefaultHasher::new();
        word.to_lowercase().hash(&mut hasher);
        let bucket = (hasher.finish() % DIMENSION as u64) as usize;
        values[bucket] += 1.0;
    }
    if values.iter().all(|v| *v == 0.0) {
        values[0] = 1.0;
    }
    values
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": { "message": message } }))).into_response()
}

fn content_text(request: &Value) -> String {
    request["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

async fn dispatch(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    if path.starts_with("/models/") {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(GEMINI_KEY) {
            return error(StatusCode::FORBIDDEN, "API key not valid");
        }
        return gemini(&shared, &path, &body);
    }

    if let Some(name) = path.strip_prefix("/files/") {
        let file = shared.state.lock().unwrap().files.get(name).cloned();
        return match file {
            Some(bytes) => (StatusCode::OK, bytes).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        };
    }

    if headers.get("Api-Key").and_then(|v| v.to_str().ok()) != Some(PINECONE_KEY) {
        return error(StatusCode::UNAUTHORIZED, "Invalid API Key");
    }
    pinecone(&shared, &method, &path, &body)
}

fn gemini(shared: &Shared, path: &str, body: &Value) -> Response {
    if path.ends_with(":embedContent") {
        let values = fake_embedding(&content_text(body));
        return Json(json!({ "embedding": { "values": values } })).into_response();
    }
    if path.ends_with(":batchEmbedContents") {
        let embeddings: Vec<Value> = body["requests"]
            .as_array()
            .map(|requests| {
                requests
                    .iter()
                    .map(|r| json!({ "values": fake_embedding(&content_text(r)) }))
                    .collect()
            })
            .unwrap_or_default();
        return Json(json!({ "embeddings": embeddings })).into_response();
    }
    if path.ends_with(":generateContent") {
        shared
            .state
            .lock()
            .unwrap()
            .generate_requests
            .push(body.clone());
        return Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": FAKE_ANSWER }] },
                "finishReason": "STOP"
            }]
        }))
        .into_response();
    }
    error(StatusCode::NOT_FOUND, "unknown method")
}

fn describe(shared: &Shared, name: &str, index: &FakeIndex) -> Value {
    json!({
        "name": name,
        "dimension": index.dimension,
        "metric": index.metric,
        "host": format!("{}/data/{}", shared.base_url, name),
        "status": {
            "ready": index.ready,
            "state": if index.ready { "Ready" } else { "Initializing" }
        }
    })
}

fn pinecone(shared: &Shared, method: &Method, path: &str, body: &Value) -> Response {
    let mut state = shared.state.lock().unwrap();

    if path == "/indexes" && method == Method::GET {
        let indexes: Vec<Value> = state
            .indexes
            .iter()
            .map(|(name, index)| describe(shared, name, index))
            .collect();
        return Json(json!({ "indexes": indexes })).into_response();
    }

    if path == "/indexes" && method == Method::POST {
        let name = body["name"].as_str().unwrap_or_default().to_string();
        if state.indexes.contains_key(&name) {
            return error(StatusCode::CONFLICT, "Resource already exists");
        }
        state.create_calls += 1;
        let index = FakeIndex {
            dimension: body["dimension"].as_u64().unwrap_or_default() as usize,
            metric: body["metric"].as_str().unwrap_or_default().to_string(),
            cloud: body["spec"]["serverless"]["cloud"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            region: body["spec"]["serverless"]["region"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            ready: false,
            vectors: Vec::new(),
        };
        let description = describe(shared, &name, &index);
        state.indexes.insert(name, index);
        return (StatusCode::CREATED, Json(description)).into_response();
    }

    if let Some(name) = path.strip_prefix("/indexes/") {
        return match state.indexes.get_mut(name) {
            Some(index) => {
                let description = describe(shared, name, index);
                // Ready from the second describe on
                index.ready = true;
                Json(description).into_response()
            }
            None => error(StatusCode::NOT_FOUND, "Resource not found"),
        };
    }

    if let Some(rest) = path.strip_prefix("/data/") {
        let (name, op) = rest.split_once('/').unwrap_or((rest, ""));
        let Some(index) = state.indexes.get_mut(name) else {
            return error(StatusCode::NOT_FOUND, "Index not found");
        };

        if op == "vectors/upsert" {
            let vectors = body["vectors"].as_array().cloned().unwrap_or_default();
            let count = vectors.len();
            for v in vectors {
                index.vectors.push(FakeVector {
                    id: v["id"].as_str().unwrap_or_default().to_string(),
                    values: v["values"]
                        .as_array()
                        .map(|vals| vals.iter().filter_map(Value::as_f64).map(|x| x as f32).collect())
                        .unwrap_or_default(),
                    metadata: v["metadata"].clone(),
                });
            }
            state.upsert_calls += 1;
            return Json(json!({ "upsertedCount": count })).into_response();
        }

        if op == "query" {
            let query: Vec<f32> = body["vector"]
                .as_array()
                .map(|vals| vals.iter().filter_map(Value::as_f64).map(|x| x as f32).collect())
                .unwrap_or_default();
            let top_k = body["topK"].as_u64().unwrap_or(10) as usize;

            let mut scored: Vec<(f32, &FakeVector)> = index
                .vectors
                .iter()
                .map(|v| (cosine(&query, &v.values), v))
                .collect();
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));

            let matches: Vec<Value> = scored
                .into_iter()
                .take(top_k)
                .map(|(score, v)| json!({ "id": v.id, "score": score, "metadata": v.metadata }))
                .collect();
            return Json(json!({ "matches": matches, "namespace": "" })).into_response();
        }
    }

    error(StatusCode::NOT_FOUND, "unknown route")
}
