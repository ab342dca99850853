//! Download service: URL + kind in, bytes on disk or a classified failure out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

use fetchbot_core::{
    DownloadKind, DownloadRequest, DownloadResult, FetchError, TransferStats, VideoFetcher,
    VideoJob,
};

use crate::filename::{derive_filename, part_path};
use crate::stream::{stream_to_file, DEFAULT_CHUNK_SIZE};

/// Settings for generic file downloads.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub destination_dir: PathBuf,
    pub chunk_size: usize,
    /// Upper bound on a whole request, body included.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            destination_dir: PathBuf::from("./downloads"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("fetchbot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// How video jobs are described to the video fetcher.
#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub template: String,
    pub format: String,
    pub merge_format: String,
    pub no_playlist: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            template: "%(title)s.%(ext)s".to_string(),
            format: "bestvideo+bestaudio/best".to_string(),
            merge_format: "mp4".to_string(),
            no_playlist: true,
        }
    }
}

/// A completed file download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub stats: TransferStats,
}

/// Performs one fetch per call. Holds no per-request state, so a single
/// instance is shared across concurrent webhook deliveries.
///
/// Two fetches that derive the same filename each stream into their own
/// partial file; whichever finishes last owns the destination.
pub struct DownloadService {
    settings: DownloadSettings,
    video: VideoSettings,
    client: Client,
    video_fetcher: Arc<dyn VideoFetcher>,
}

impl DownloadService {
    /// Create the service, creating the destination directory if needed.
    pub fn new(
        settings: DownloadSettings,
        video: VideoSettings,
        video_fetcher: Arc<dyn VideoFetcher>,
    ) -> Result<Self, FetchError> {
        std::fs::create_dir_all(&settings.destination_dir)?;

        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("building HTTP client: {e}")))?;

        info!(
            dir = %settings.destination_dir.display(),
            chunk_size = settings.chunk_size,
            video_fetcher = video_fetcher.name(),
            "Download service ready"
        );

        Ok(Self {
            settings,
            video,
            client,
            video_fetcher,
        })
    }

    pub fn destination_dir(&self) -> &Path {
        &self.settings.destination_dir
    }

    /// Route a request to the operation for its kind.
    pub async fn fetch(&self, request: &DownloadRequest) -> DownloadResult {
        match request.kind {
            DownloadKind::File => self.fetch_file(&request.url).await,
            DownloadKind::Video => self.fetch_video(&request.url).await,
            DownloadKind::App => self.fetch_app(&request.url).await,
        }
    }

    /// Download a generic file into the destination directory.
    pub async fn fetch_file(&self, url: &str) -> DownloadResult {
        match self.download_file(url).await {
            Ok(saved) => DownloadResult::saved(saved.path),
            Err(e) => {
                warn!(url = %url, error_kind = e.kind(), error = %e, "File download failed");
                DownloadResult::failed(e.to_string())
            }
        }
    }

    /// Application packages take the generic file path.
    pub async fn fetch_app(&self, url: &str) -> DownloadResult {
        self.fetch_file(url).await
    }

    /// Hand the URL to the video fetcher. Success carries no path.
    pub async fn fetch_video(&self, url: &str) -> DownloadResult {
        match self.download_video(url).await {
            Ok(()) => DownloadResult::completed(),
            Err(e) => {
                warn!(url = %url, error_kind = e.kind(), error = %e, "Video download failed");
                DownloadResult::failed(e.to_string())
            }
        }
    }

    /// Fallible core of [`fetch_file`](Self::fetch_file).
    ///
    /// The body is streamed into a per-call `<name>.<uuid>.part` and renamed onto
    /// `<destination_dir>/<name>` once complete, replacing any file of the
    /// same name. On failure the partial file is removed and an existing
    /// destination file is left untouched.
    #[instrument(skip(self), fields(dir = %self.settings.destination_dir.display()))]
    pub async fn download_file(&self, url: &str) -> Result<SavedFile, FetchError> {
        let url = parse_http_url(url)?;
        let destination = self.settings.destination_dir.join(derive_filename(&url));

        info!(url = %url, path = %destination.display(), "Downloading file");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let part = part_path(&destination);
        let written = match stream_to_file(response, &part, self.settings.chunk_size).await {
            Ok(stats) => fs::rename(&part, &destination).await.map(|_| stats).map_err(FetchError::from),
            Err(e) => Err(e),
        };

        match written {
            Ok(stats) => {
                info!(path = %destination.display(), bytes = stats.bytes, "Saved file");
                Ok(SavedFile {
                    path: destination,
                    stats,
                })
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&part).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %part.display(), error = %rm, "Could not remove partial file");
                    }
                }
                Err(e)
            }
        }
    }

    /// Fallible core of [`fetch_video`](Self::fetch_video).
    pub async fn download_video(&self, url: &str) -> Result<(), FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidInput("empty URL".to_string()));
        }

        let job = self.video_job(url);
        info!(
            url = %url,
            fetcher = self.video_fetcher.name(),
            template = %job.output_template().display(),
            "Downloading video"
        );
        self.video_fetcher.fetch(&job).await?;
        info!(url = %url, "Video download finished");
        Ok(())
    }

    fn video_job(&self, url: &str) -> VideoJob {
        VideoJob {
            url: url.trim().to_string(),
            output_dir: self.settings.destination_dir.clone(),
            template: self.video.template.clone(),
            format: self.video.format.clone(),
            merge_format: self.video.merge_format.clone(),
            no_playlist: self.video.no_playlist,
        }
    }
}

/// Accept only absolute http(s) URLs.
fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FetchError::InvalidInput("empty URL".to_string()));
    }
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidInput(format!("'{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidInput(format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Notify;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingFetcher {
        jobs: Mutex<Vec<VideoJob>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl VideoFetcher for RecordingFetcher {
        fn name(&self) -> &str {
            "recording"
        }

        async fn fetch(&self, job: &VideoJob) -> Result<(), FetchError> {
            self.jobs.lock().unwrap().push(job.clone());
            match &self.fail_with {
                Some(msg) => Err(FetchError::Collaborator(msg.clone())),
                None => Ok(()),
            }
        }
    }

    fn service_in(dir: &Path, fetcher: Arc<RecordingFetcher>) -> DownloadService {
        let settings = DownloadSettings {
            destination_dir: dir.to_path_buf(),
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        DownloadService::new(settings, VideoSettings::default(), fetcher).unwrap()
    }

    async fn serve(server: &MockServer, route: &str, body: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(server)
            .await;
    }

    fn leftover_parts(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect()
    }

    /// Serves one request: headers plus the first half of `body`, then the
    /// rest once `release` is notified.
    async fn serve_in_halves(body: Vec<u8>, release: Arc<Notify>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            let (front, back) = body.split_at(body.len() / 2);
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(front).await.unwrap();
            socket.flush().await.unwrap();
            release.notified().await;
            socket.write_all(back).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn new_creates_destination_dir() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        let _svc = service_in(&nested, Arc::default());
        assert!(nested.is_dir());
        // Idempotent on an existing directory.
        let _again = service_in(&nested, Arc::default());
    }

    #[tokio::test]
    async fn saves_file_with_identical_content() {
        let server = MockServer::start().await;
        let body: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        serve(&server, "/sub/dir/report.pdf", body.clone()).await;

        let tmp = TempDir::new().unwrap();
        let svc = service_in(tmp.path(), Arc::default());
        let result = svc.fetch_file(&format!("{}/sub/dir/report.pdf", server.uri())).await;

        let expected = tmp.path().join("report.pdf");
        assert_eq!(result, DownloadResult::saved(expected.clone()));
        assert_eq!(std::fs::read(&expected).unwrap(), body);
        assert!(leftover_parts(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn root_path_saves_as_fallback_name() {
        let server = MockServer::start().await;
        serve(&server, "/", b"index".to_vec()).await;

        let tmp = TempDir::new().unwrap();
        let svc = service_in(tmp.path(), Arc::default());
        let result = svc.fetch_file(&format!("{}/", server.uri())).await;

        assert_eq!(result.saved_path, Some(tmp.path().join("file")));
        assert_eq!(std::fs::read(tmp.path().join("file")).unwrap(), b"index");
    }

    #[tokio::test]
    async fn http_error_status_fails_without_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let svc = service_in(tmp.path(), Arc::default());
        let err = svc
            .download_file(&format!("{}/missing.zip", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::HttpStatus { status: 404, .. }));
        assert!(!tmp.path().join("missing.zip").exists());
        assert!(leftover_parts(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn failed_download_keeps_previous_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("data.bin"), b"old").unwrap();
        let svc = service_in(tmp.path(), Arc::default());
        let result = svc.fetch_file(&format!("{}/data.bin", server.uri())).await;

        assert!(!result.is_success());
        assert_eq!(std::fs::read(tmp.path().join("data.bin")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let tmp = TempDir::new().unwrap();
        let svc = service_in(tmp.path(), Arc::default());
        let err = svc
            .download_file(&format!("http://127.0.0.1:{port}/thing.bin"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "transport");
        assert!(!tmp.path().join("thing.bin").exists());
    }

    #[tokio::test]
    async fn slow_server_hits_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let settings = DownloadSettings {
            destination_dir: tmp.path().to_path_buf(),
            request_timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let svc = DownloadService::new(settings, VideoSettings::default(), Arc::new(RecordingFetcher::default())).unwrap();
        let result = svc.fetch_file(&format!("{}/late.txt", server.uri())).await;

        assert!(!result.is_success());
        assert!(!tmp.path().join("late.txt").exists());
    }

    #[tokio::test]
    async fn same_name_is_overwritten() {
        let first = MockServer::start().await;
        let second = MockServer::start().await;
        serve(&first, "/data.bin", b"first version".to_vec()).await;
        serve(&second, "/data.bin", b"second".to_vec()).await;

        let tmp = TempDir::new().unwrap();
        let svc = service_in(tmp.path(), Arc::default());
        let a = svc.fetch_file(&format!("{}/data.bin", first.uri())).await;
        let b = svc.fetch_file(&format!("{}/data.bin", second.uri())).await;

        assert_eq!(a.saved_path, b.saved_path);
        assert_eq!(std::fs::read(tmp.path().join("data.bin")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn overlapping_same_name_fetches_both_complete() {
        let slow_body: Vec<u8> = (0..40_000u32).map(|i| (i % 241) as u8).collect();
        let release = Arc::new(Notify::new());
        let slow_base = serve_in_halves(slow_body.clone(), release.clone()).await;

        let fast = MockServer::start().await;
        serve(&fast, "/fast/data.bin", b"fast copy".to_vec()).await;

        let tmp = TempDir::new().unwrap();
        let svc = Arc::new(service_in(tmp.path(), Arc::default()));

        let slow = {
            let svc = svc.clone();
            let url = format!("{slow_base}/slow/data.bin");
            tokio::spawn(async move { svc.download_file(&url).await })
        };

        // Wait until the slow fetch has its partial file on disk.
        let mut waited = 0;
        while leftover_parts(tmp.path()).is_empty() {
            assert!(waited < 500, "slow fetch never started writing");
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }

        let saved = svc
            .download_file(&format!("{}/fast/data.bin", fast.uri()))
            .await
            .unwrap();
        let destination = tmp.path().join("data.bin");
        assert_eq!(saved.path, destination);
        assert_eq!(std::fs::read(&destination).unwrap(), b"fast copy");
        assert_eq!(leftover_parts(tmp.path()).len(), 1);

        release.notify_one();
        let slow_saved = slow.await.unwrap().unwrap();

        assert_eq!(slow_saved.path, destination);
        assert_eq!(slow_saved.stats.bytes, slow_body.len() as u64);
        assert_eq!(std::fs::read(&destination).unwrap(), slow_body);
        assert!(leftover_parts(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn large_body_is_streamed_in_bounded_chunks() {
        let server = MockServer::start().await;
        let chunk_size = 8 * 1024;
        let body = vec![7u8; chunk_size * 256];
        serve(&server, "/big.iso", body.clone()).await;

        let tmp = TempDir::new().unwrap();
        let svc = service_in(tmp.path(), Arc::default());
        let saved = svc
            .download_file(&format!("{}/big.iso", server.uri()))
            .await
            .unwrap();

        assert_eq!(saved.stats.bytes, body.len() as u64);
        assert!(saved.stats.largest_chunk <= chunk_size);
        assert!(saved.stats.chunks >= 256);
        assert_eq!(std::fs::metadata(&saved.path).unwrap().len(), body.len() as u64);
    }

    #[tokio::test]
    async fn empty_and_malformed_urls_are_invalid_input() {
        let tmp = TempDir::new().unwrap();
        let svc = service_in(tmp.path(), Arc::default());

        for bad in ["", "   ", "not a url", "ftp://example.test/file.txt"] {
            let err = svc.download_file(bad).await.unwrap_err();
            assert_eq!(err.kind(), "invalid_input", "input {bad:?}");
        }
        assert!(!svc.fetch_file("").await.is_success());
    }

    #[tokio::test]
    async fn app_uses_file_path() {
        let server = MockServer::start().await;
        serve(&server, "/builds/tool.apk", b"PK\x03\x04".to_vec()).await;

        let tmp = TempDir::new().unwrap();
        let svc = service_in(tmp.path(), Arc::default());
        let result = svc
            .fetch(&DownloadRequest::new(format!("{}/builds/tool.apk", server.uri()), DownloadKind::App))
            .await;

        assert_eq!(result, DownloadResult::saved(tmp.path().join("tool.apk")));
    }

    #[tokio::test]
    async fn video_job_uses_destination_and_template() {
        let tmp = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        let svc = service_in(tmp.path(), fetcher.clone());

        let result = svc.fetch_video("https://video.test/watch?v=abc").await;
        assert_eq!(result, DownloadResult::completed());

        let jobs = fetcher.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].url, "https://video.test/watch?v=abc");
        assert_eq!(jobs[0].output_dir, tmp.path());
        assert_eq!(jobs[0].template, "%(title)s.%(ext)s");
        assert_eq!(jobs[0].merge_format, "mp4");
        assert!(jobs[0].no_playlist);
    }

    #[tokio::test]
    async fn video_failure_is_reported_with_detail() {
        let tmp = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher {
            fail_with: Some("Unsupported URL".to_string()),
            ..Default::default()
        });
        let svc = service_in(tmp.path(), fetcher.clone());

        let result = svc.fetch_video("https://video.test/nope").await;
        assert!(!result.is_success());
        assert!(result.saved_path.is_none());
        assert!(result.error_detail.unwrap().contains("Unsupported URL"));
    }

    #[tokio::test]
    async fn empty_video_url_never_reaches_fetcher() {
        let tmp = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        let svc = service_in(tmp.path(), fetcher.clone());

        assert!(!svc.fetch_video("").await.is_success());
        assert!(fetcher.jobs.lock().unwrap().is_empty());
    }
}
