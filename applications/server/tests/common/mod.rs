//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use cadence_core::{CreateTrack, StorageContext, Track};
use cadence_playback::{
    testing::{MockEngine, MockEngineHandle, StaticResolver},
    PlaybackConfig, PlaybackService, ResourceResolver,
};
use cadence_server::{create_router, services::FileStorage, state::AppState};
use cadence_storage::LocalStorageContext;
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

/// Every file the test resolver accepts reports this length
pub const TRACK_LENGTH: Duration = Duration::from_secs(180);

/// Router wired to a real SQLite file, a temp music directory and the mock engine
pub struct TestApp {
    pub router: Router,
    pub db: Arc<LocalStorageContext>,
    pub engine: MockEngineHandle,
    pub storage: Arc<FileStorage>,
    _temp_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_upload_limit(3 * 1024 * 1024).await
    }

    pub async fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self::build(
            max_upload_bytes,
            Arc::new(StaticResolver::on_disk(TRACK_LENGTH, 44_100)),
        )
        .await
    }

    /// Use `resolver` for playback and upload probing
    pub async fn with_resolver(resolver: Arc<dyn ResourceResolver>) -> Self {
        Self::build(3 * 1024 * 1024, resolver).await
    }

    async fn build(max_upload_bytes: usize, resolver: Arc<dyn ResourceResolver>) -> Self {
        let temp_dir = TempDir::new().unwrap();

        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
        let db = Arc::new(LocalStorageContext::connect(&db_url).await.unwrap());

        let storage = FileStorage::new(temp_dir.path().join("FileStorage"));
        storage.initialize().await.unwrap();
        let storage = Arc::new(storage);

        let mut engine = None;
        let playback = PlaybackService::spawn(
            PlaybackConfig::default(),
            Arc::clone(&resolver),
            |events| {
                let (mock, handle) = MockEngine::new(events);
                engine = Some(handle);
                Box::new(mock)
            },
        );

        let app_state = AppState::new(
            db.clone(),
            playback,
            resolver,
            Arc::clone(&storage),
            max_upload_bytes,
        );

        Self {
            router: create_router(app_state),
            db,
            engine: engine.unwrap(),
            storage,
            _temp_dir: temp_dir,
        }
    }

    /// Write a file into the music directory
    pub fn write_music_file(&self, name: &str) -> String {
        let path = self.storage.music_dir().join(name);
        std::fs::write(&path, b"ID3 fake audio").unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Insert a track whose file exists on disk
    pub async fn track_on_disk(&self, title: &str, artist: &str) -> Track {
        let file_name = format!("{}.mp3", title.to_lowercase().replace(' ', "_"));
        let file_path = self.write_music_file(&file_name);
        self.insert_track(&file_path, title, artist).await
    }

    /// Insert a track row without touching the disk
    pub async fn insert_track(&self, file_path: &str, title: &str, artist: &str) -> Track {
        self.db
            .create_track(CreateTrack {
                file_path: file_path.to_string(),
                title: title.to_string(),
                artist: artist.to_string(),
                duration_minutes: 3.0,
            })
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        into_json(response).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Names of the files in the music directory, sorted
    pub fn music_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.storage.music_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Wait until the engine-event loop has applied pending events
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

pub async fn into_json(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

/// Build a multipart/form-data body
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: audio/mpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// Formatted log output collected on the current thread
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's logs into a `LogCapture` until the guard drops
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}
