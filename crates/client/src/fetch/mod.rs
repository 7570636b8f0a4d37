//! Candidate image download pipeline with SSRF protection.
//!
//! ### Location Handling
//! - `http(s)://` URLs are canonicalized (lowercase host, no fragment).
//! - `data:image/*;base64,` references are decoded in place, no network.
//! - Anything else is rejected up front.
//!
//! ### SSRF & Safety Gates
//! - Deny private ranges (RFC1918, link-local, localhost, etc.)
//! - Resolve DNS and validate all A/AAAA answers are public.
//! - Redirects are followed by hand (max 5) and every hop is re-checked.
//! - Max body bytes: 10MB (configurable), enforced while streaming.
//!
//! ### Storage
//! - Files land in the configured images directory as
//!   `{query_slug}_{sha256(location)[..16]}.{ext}`, so re-downloading the
//!   same candidate for the same query overwrites instead of piling up.

pub mod location;
pub mod ssrf;

use bytes::Bytes;
use reqwest::{Client, Response, header};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use url::{Host, Url};

pub use location::{Location, LocationError, parse_location};
pub use ssrf::{SsrfError, check_url, validate_ip};

use productshot_core::{AppConfig, Downloader, Error};

/// Accept header for candidate downloads.
///
/// Only formats the validator can decode are advertised, so negotiating CDNs
/// do not answer with AVIF.
pub const IMAGE_ACCEPT: &str = "image/webp,image/png,image/jpeg,image/*;q=0.8,*/*;q=0.5";

/// Configuration for the image downloader.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// User agent string (default: "productshot/0.1")
    pub user_agent: String,

    /// Maximum image size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Directory downloaded images are written to.
    pub images_dir: PathBuf,

    /// Let loopback IP literals through the address check (local test servers).
    /// Every other private range stays blocked.
    pub allow_loopback: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: "productshot/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            images_dir: PathBuf::from("./public/images"),
            allow_loopback: false,
        }
    }
}

impl From<&AppConfig> for DownloadConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            images_dir: config.images_dir.clone(),
            ..Default::default()
        }
    }
}

/// Image bytes fetched from a candidate location.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    /// Content-Type header, or the MIME type of a data reference.
    pub content_type: Option<String>,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Downloads candidate images to local storage.
pub struct ImageDownloader {
    http: Client,
    config: DownloadConfig,
}

impl ImageDownloader {
    /// Create a new downloader with the given configuration.
    pub fn new(config: DownloadConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Fetch the bytes behind a candidate location without storing them.
    pub async fn fetch(&self, location: &str) -> Result<FetchedImage, Error> {
        let start = Instant::now();

        match parse_location(location).map_err(|e| Error::InvalidLocation(e.to_string()))? {
            Location::Data { mime, bytes } => {
                check_size(bytes.len(), self.config.max_bytes)?;
                Ok(FetchedImage {
                    bytes: Bytes::from(bytes),
                    content_type: Some(mime),
                    fetch_ms: start.elapsed().as_millis() as u64,
                })
            }
            Location::Http(url) => {
                let (final_url, response) = self.follow(url).await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(Error::HttpError(format!("status {}", status.as_u16())));
                }

                let content_type = response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string());

                let bytes = self.read_body(response).await?;
                let fetch_ms = start.elapsed().as_millis() as u64;

                tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", location, final_url, fetch_ms, bytes.len());

                Ok(FetchedImage { bytes, content_type, fetch_ms })
            }
        }
    }

    /// Write fetched bytes under the images directory and return the path.
    pub async fn store(&self, query: &str, location: &str, image: &FetchedImage) -> Result<PathBuf, Error> {
        tokio::fs::create_dir_all(&self.config.images_dir).await?;

        let path = self.config.images_dir.join(file_name_for(query, location, image.content_type.as_deref()));
        tokio::fs::write(&path, &image.bytes).await?;

        Ok(path)
    }

    /// Send the request, following redirects by hand so each hop passes the address check.
    async fn follow(&self, mut url: Url) -> Result<(Url, Response), Error> {
        let mut redirects = 0;

        loop {
            self.guard(&url).await?;

            let response = self
                .http
                .get(url.as_str())
                .header(header::ACCEPT, IMAGE_ACCEPT)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        Error::FetchTimeout(url.to_string())
                    } else {
                        Error::HttpError(format!("network error: {}", e))
                    }
                })?;

            if !response.status().is_redirection() {
                return Ok((url, response));
            }

            if redirects >= self.config.max_redirects {
                return Err(Error::HttpError(format!("too many redirects (max {})", self.config.max_redirects)));
            }
            redirects += 1;

            let target = response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok());
            let next = redirect_target(&url, target)?;
            tracing::debug!("redirect {} -> {}", url, next);
            url = next;
        }
    }

    async fn guard(&self, url: &Url) -> Result<(), Error> {
        if self.config.allow_loopback && is_loopback_literal(url) {
            return Ok(());
        }
        check_url(url).await.map_err(|e| Error::SsrfBlocked(e.to_string()))
    }

    /// Stream the body, giving up as soon as it outgrows `max_bytes`.
    async fn read_body(&self, mut response: Response) -> Result<Bytes, Error> {
        let max = self.config.max_bytes;

        if let Some(len) = response.content_length() {
            check_size(len as usize, max)?;
        }

        let hint = response.content_length().map_or(0, |n| n as usize).min(max);
        let mut body = Vec::with_capacity(hint);

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?
        {
            append_limited(&mut body, &chunk, max)?;
        }

        Ok(Bytes::from(body))
    }
}

#[async_trait::async_trait]
impl Downloader for ImageDownloader {
    async fn download(&self, location: &str, query: &str) -> Result<PathBuf, Error> {
        let image = self.fetch(location).await?;
        let path = self.store(query, location, &image).await?;
        tracing::info!(
            query,
            path = %path.display(),
            bytes = image.bytes.len(),
            fetch_ms = image.fetch_ms,
            "downloaded candidate"
        );
        Ok(path)
    }
}

fn check_size(len: usize, max: usize) -> Result<(), Error> {
    if len > max {
        return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, max)));
    }
    Ok(())
}

fn append_limited(body: &mut Vec<u8>, chunk: &[u8], max: usize) -> Result<(), Error> {
    check_size(body.len() + chunk.len(), max)?;
    body.extend_from_slice(chunk);
    Ok(())
}

/// Resolve a `Location` header against the URL that produced it.
fn redirect_target(current: &Url, location: Option<&str>) -> Result<Url, Error> {
    let location = location.ok_or_else(|| Error::HttpError("redirect without Location header".into()))?;
    let joined = current
        .join(location)
        .map_err(|e| Error::InvalidLocation(format!("bad redirect target: {}", e)))?;

    match parse_location(joined.as_str()).map_err(|e| Error::InvalidLocation(e.to_string()))? {
        Location::Http(url) => Ok(url),
        Location::Data { .. } => Err(Error::InvalidLocation("redirect to data reference".into())),
    }
}

fn is_loopback_literal(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        _ => false,
    }
}

/// Build the on-disk file name for a candidate.
pub fn file_name_for(query: &str, location: &str, content_type: Option<&str>) -> String {
    let slug: String = query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let slug = if slug.is_empty() { "image".to_string() } else { slug };

    let mut hasher = Sha256::new();
    hasher.update(location.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("{}_{}.{}", slug, &digest[..16], extension_for(content_type))
}

/// File extension for a Content-Type, defaulting to `jpg`.
fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match mime.as_str() {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/avif" => "avif",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use std::io::Cursor;
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn white_png() -> Vec<u8> {
        let image = image::RgbImage::from_pixel(16, 16, image::Rgb([255, 255, 255]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn downloader_in(dir: &Path) -> ImageDownloader {
        ImageDownloader::new(DownloadConfig { images_dir: dir.to_path_buf(), ..Default::default() }).unwrap()
    }

    fn local_downloader_in(dir: &Path) -> ImageDownloader {
        let config = DownloadConfig { images_dir: dir.to_path_buf(), allow_loopback: true, ..Default::default() };
        ImageDownloader::new(config).unwrap()
    }

    #[test]
    fn test_download_config_default() {
        let config = DownloadConfig::default();
        assert_eq!(config.user_agent, "productshot/0.1");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
        assert!(!config.allow_loopback);
    }

    #[test]
    fn test_download_config_from_app_config() {
        let app = AppConfig { max_bytes: 1024, images_dir: PathBuf::from("/tmp/shots"), ..Default::default() };
        let config = DownloadConfig::from(&app);
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.images_dir, PathBuf::from("/tmp/shots"));
        assert_eq!(config.user_agent, app.user_agent);
    }

    #[test]
    fn test_accept_header_skips_undecodable_formats() {
        assert!(!IMAGE_ACCEPT.contains("avif"));
        assert!(IMAGE_ACCEPT.starts_with("image/webp,image/png,image/jpeg"));
    }

    #[test]
    fn test_file_name_for() {
        let name = file_name_for("Be Lenka  Champ", "https://cdn.example.com/a.png", Some("image/png"));
        assert!(name.starts_with("be_lenka_champ_"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "be_lenka_champ_".len() + 16 + ".png".len());
    }

    #[test]
    fn test_file_name_is_stable_per_location() {
        let a = file_name_for("Bohempia Herb", "https://a.example/1.jpg", None);
        let b = file_name_for("Bohempia Herb", "https://a.example/1.jpg", None);
        let c = file_name_for("Bohempia Herb", "https://a.example/2.jpg", None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_file_name_strips_path_separators() {
        let name = file_name_for("../../etc/passwd", "https://a.example/x", None);
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for(Some("image/PNG; charset=binary")), "png");
        assert_eq!(extension_for(Some("image/webp")), "webp");
        assert_eq!(extension_for(Some("application/octet-stream")), "jpg");
        assert_eq!(extension_for(None), "jpg");
    }

    #[test]
    fn test_append_limited_stops_at_max() {
        let mut body = Vec::new();
        append_limited(&mut body, &[0u8; 60], 100).unwrap();
        append_limited(&mut body, &[0u8; 40], 100).unwrap();
        assert_eq!(body.len(), 100);

        let result = append_limited(&mut body, &[0u8; 1], 100);
        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
        assert_eq!(body.len(), 100);
    }

    #[test]
    fn test_redirect_target() {
        let current = Url::parse("https://cdn.example.com/a/shoe.jpg").unwrap();
        assert_eq!(
            redirect_target(&current, Some("/b/shoe.png")).unwrap().as_str(),
            "https://cdn.example.com/b/shoe.png"
        );
        assert_eq!(
            redirect_target(&current, Some("https://Other.Example.com/x#frag")).unwrap().as_str(),
            "https://other.example.com/x"
        );
        assert!(matches!(redirect_target(&current, None), Err(Error::HttpError(_))));
        assert!(matches!(redirect_target(&current, Some("file:///etc/passwd")), Err(Error::InvalidLocation(_))));
    }

    #[tokio::test]
    async fn test_downloader_new() {
        assert!(ImageDownloader::new(DownloadConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_download_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = downloader_in(dir.path());
        let png = white_png();
        let location = format!("data:image/png;base64,{}", STANDARD.encode(&png));

        let path = downloader.download(&location, "Be Lenka Champ").await.unwrap();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(std::fs::read(&path).unwrap(), png);
    }

    #[tokio::test]
    async fn test_download_creates_images_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("public").join("images");
        let downloader = downloader_in(&nested);
        let location = format!("data:image/png;base64,{}", STANDARD.encode(white_png()));

        downloader.download(&location, "Freet Barefoot Flex").await.unwrap();

        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_download_data_uri_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(DownloadConfig {
            images_dir: dir.path().to_path_buf(),
            max_bytes: 8,
            ..Default::default()
        })
        .unwrap();
        let location = format!("data:image/png;base64,{}", STANDARD.encode(white_png()));

        let result = downloader.download(&location, "Bohempia Herb").await;
        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
    }

    #[tokio::test]
    async fn test_download_rejects_relative_location() {
        let dir = tempfile::tempdir().unwrap();
        let result = downloader_in(dir.path()).download("/thumbs/shoe.jpg", "Vivobarefoot Primus").await;
        assert!(matches!(result, Err(Error::InvalidLocation(_))));
    }

    #[tokio::test]
    async fn test_download_blocks_private_address() {
        let dir = tempfile::tempdir().unwrap();
        let result = downloader_in(dir.path()).download("http://192.168.1.1/shoe.jpg", "Vivobarefoot Primus").await;
        assert!(matches!(result, Err(Error::SsrfBlocked(_))));
    }

    #[tokio::test]
    async fn test_download_blocks_loopback_by_default() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let result = downloader_in(dir.path()).download(&format!("{}/shoe.png", server.uri()), "Be Lenka Champ").await;

        assert!(matches!(result, Err(Error::SsrfBlocked(_))));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_download_http_sends_image_accept() {
        let server = MockServer::start().await;
        let png = white_png();
        Mock::given(method("GET"))
            .and(path("/champ.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(png.clone(), "image/png"))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let path = local_downloader_in(dir.path())
            .download(&format!("{}/champ.png", server.uri()), "Be Lenka Champ")
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), png);
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

        let requests = server.received_requests().await.unwrap();
        let accept = requests[0].headers.get("accept").and_then(|v| v.to_str().ok());
        assert_eq!(accept, Some(IMAGE_ACCEPT));
    }

    #[tokio::test]
    async fn test_download_follows_redirect_on_same_host() {
        let server = MockServer::start().await;
        let png = white_png();
        Mock::given(method("GET"))
            .and(path("/old.jpg"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new.png"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(png.clone(), "image/png"))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let path = local_downloader_in(dir.path())
            .download(&format!("{}/old.jpg", server.uri()), "Wildling Shoes Tanuki")
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), png);
    }

    #[tokio::test]
    async fn test_download_blocks_redirect_to_private_address() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shoe.jpg"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "http://169.254.169.254/latest/meta-data/"),
            )
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let result = local_downloader_in(dir.path())
            .download(&format!("{}/shoe.jpg", server.uri()), "Vivobarefoot Primus")
            .await;

        assert!(matches!(result, Err(Error::SsrfBlocked(_))));
    }

    #[tokio::test]
    async fn test_download_too_many_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(DownloadConfig {
            images_dir: dir.path().to_path_buf(),
            allow_loopback: true,
            max_redirects: 2,
            ..Default::default()
        })
        .unwrap();

        let result = downloader.download(&format!("{}/loop", server.uri()), "Bohempia Herb").await;

        assert!(matches!(result, Err(Error::HttpError(reason)) if reason.contains("too many redirects")));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_download_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let result = local_downloader_in(dir.path())
            .download(&format!("{}/gone.jpg", server.uri()), "Freet Barefoot Flex")
            .await;

        assert!(matches!(result, Err(Error::HttpError(reason)) if reason.contains("404")));
    }

    #[tokio::test]
    async fn test_download_http_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 4096], "image/jpeg"))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(DownloadConfig {
            images_dir: dir.path().to_path_buf(),
            allow_loopback: true,
            max_bytes: 1024,
            ..Default::default()
        })
        .unwrap();

        let result = downloader.download(&format!("{}/huge.jpg", server.uri()), "Be Lenka Champ").await;

        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
    }
}
