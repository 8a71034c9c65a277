//! Batch download tests: mocked API, real files in a temp directory.
//!
//! Run: cargo nextest run --test download_tests

use std::io::Cursor;
use std::sync::Mutex;

use catto::{
    BackoffConfig, Category, Client, DownloadObserver, DownloadReport, Downloader, Error,
    RetryConfig, SavedImage,
};
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn encoded(format: ImageFormat) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(4, 3, Rgb([12u8, 200, 90]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

async fn downloader_for(server: &MockServer) -> Downloader {
    let client = Client::builder()
        .base_url(server.uri())
        .retry(RetryConfig::no_retry())
        .build()
        .await
        .unwrap();
    Downloader::new(client).with_pacing(BackoffConfig::new(0.001, 0.01))
}

async fn serve_image_url(server: &MockServer, api_path: &str, image_path: &str) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image": format!("{}{}", server.uri(), image_path),
            "fact": "Animals are nice."
        })))
        .mount(server)
        .await;
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl DownloadObserver for Recorder {
    fn started(&self, category: Category, amount: usize) {
        self.push(format!("started {} {}", category, amount));
    }

    fn saved(&self, image: &SavedImage) {
        self.push(format!("saved {}", image.index));
    }

    fn skipped(&self, index: usize, _error: &Error) {
        self.push(format!("skipped {}", index));
    }

    fn finished(&self, report: &DownloadReport) {
        self.push(format!("finished {}", report.names.len()));
    }
}

#[tokio::test]
async fn test_download_saves_images() {
    let server = MockServer::start().await;
    serve_image_url(&server, "/animal/cat", "/img/cat.png").await;
    let png = encoded(ImageFormat::Png);
    Mock::given(method("GET"))
        .and(path("/img/cat.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let recorder = Recorder::default();
    let downloader = downloader_for(&server).await;

    let report = downloader
        .download(Category::Cats, 3, dir.path(), &recorder)
        .await
        .unwrap();

    assert_eq!(report.names.len(), 3);
    assert_eq!(report.directory, std::fs::canonicalize(dir.path()).unwrap());
    for name in &report.names {
        assert!(name.starts_with("cats-image-"), "{}", name);
        assert!(name.ends_with(".png"), "{}", name);
        assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), png);
    }
    assert_eq!(
        recorder.events(),
        vec!["started cats 3", "saved 0", "saved 1", "saved 2", "finished 3"]
    );
}

#[tokio::test]
async fn test_concurrent_batches_share_one_downloader() {
    let server = MockServer::start().await;
    serve_image_url(&server, "/animal/cat", "/img/cat.png").await;
    serve_image_url(&server, "/animal/dog", "/img/dog.png").await;
    Mock::given(method("GET"))
        .and(path("/img/cat.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(encoded(ImageFormat::Png)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/dog.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(encoded(ImageFormat::Png)))
        .expect(2)
        .mount(&server)
        .await;

    let cats = TempDir::new().unwrap();
    let dogs = TempDir::new().unwrap();
    let downloader = downloader_for(&server).await;

    let (cat_report, dog_report) = tokio::join!(
        downloader.download(Category::Cats, 2, cats.path(), &()),
        downloader.download(Category::Dogs, 2, dogs.path(), &()),
    );

    let cat_report = cat_report.unwrap();
    let dog_report = dog_report.unwrap();
    assert_eq!(cat_report.names.len(), 2);
    assert_eq!(dog_report.names.len(), 2);
    assert!(cat_report.names.iter().all(|name| name.starts_with("cats-image-")));
    assert!(dog_report.names.iter().all(|name| name.starts_with("dogs-image-")));
}

#[tokio::test]
async fn test_extension_follows_content_not_url() {
    let server = MockServer::start().await;
    serve_image_url(&server, "/animal/dog", "/img/dog.png").await;
    Mock::given(method("GET"))
        .and(path("/img/dog.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(encoded(ImageFormat::Jpeg)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_for(&server).await;
    let report = downloader
        .download(Category::Dogs, 1, dir.path(), &())
        .await
        .unwrap();

    assert_eq!(report.names.len(), 1);
    assert!(report.names[0].starts_with("dogs-image-"));
    assert!(report.names[0].ends_with(".jpg"));
}

#[tokio::test]
async fn test_invalid_image_is_skipped() {
    let server = MockServer::start().await;
    serve_image_url(&server, "/animal/fox", "/img/fox.jpg").await;
    Mock::given(method("GET"))
        .and(path("/img/fox.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let recorder = Recorder::default();
    let downloader = downloader_for(&server).await;

    let report = downloader
        .download(Category::Foxes, 2, dir.path(), &recorder)
        .await
        .unwrap();

    assert!(report.names.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(
        recorder.events(),
        vec!["started foxes 2", "skipped 0", "skipped 1", "finished 0"]
    );
}

#[tokio::test]
async fn test_failed_url_lookup_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/animal/koala"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_for(&server).await;
    let report = downloader
        .download(Category::Koala, 2, dir.path(), &())
        .await
        .unwrap();
    assert!(report.names.is_empty());
}

#[tokio::test]
async fn test_failed_image_transfer_aborts_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/animal/panda"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image": format!("{}/img/panda.png", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/panda.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = downloader_for(&server).await;
    let err = downloader
        .download(Category::Pandas, 5, dir.path(), &())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_file_target_is_not_a_directory() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("file.txt");
    std::fs::write(&file, "x").unwrap();

    let downloader = downloader_for(&server).await;
    let err = downloader
        .download(Category::Cats, 1, &file, &())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PathNotFound(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
