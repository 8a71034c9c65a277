//! Endpoint status checks and settings resolution.
//!
//! Run: cargo nextest run --test status_and_settings_tests

use catto::config::{ConfigBuilder, MemoryConfigProvider};
use catto::{BackoffConfig, Category, Client, Settings, check_endpoints};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_pacing() -> BackoffConfig {
    BackoffConfig::new(0.001, 0.01)
}

// =============================================================================
// Status
// =============================================================================

mod status_tests {
    use super::*;

    #[tokio::test]
    async fn test_status_of_each_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/animal/cat"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/animal/dog"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::builder().base_url(server.uri()).build().await.unwrap();
        let statuses = check_endpoints(
            &client,
            &[Category::Cats, Category::Dogs, Category::Birds],
            &fast_pacing(),
        )
        .await
        .unwrap();

        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[0].category, Category::Cats);
        assert_eq!(statuses[0].status_code, 200);
        assert_eq!(statuses[0].reason, "OK");
        assert!(statuses[0].endpoint.as_str().ends_with("/animal/cat"));

        assert_eq!(statuses[1].status_code, 503);
        assert_eq!(statuses[1].reason, "Service Unavailable");
        assert!(!statuses[1].is_ok());

        // Unmocked routes answer 404.
        assert_eq!(statuses[2].status_code, 404);
    }

    #[tokio::test]
    async fn test_unreachable_endpoints_are_left_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder()
            .base_url(format!("http://{}", address))
            .build()
            .await
            .unwrap();
        let statuses = check_endpoints(&client, &[Category::Cats, Category::Koala], &fast_pacing())
            .await
            .unwrap();
        assert!(statuses.is_empty());
    }
}

// =============================================================================
// Settings
// =============================================================================

mod settings_tests {
    use super::*;

    #[tokio::test]
    async fn test_settings_from_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("settings.json");
        let body = serde_json::json!({
            "api": { "base_url": "http://127.0.0.1:4000" },
            "backoff": { "base": 0.5, "maximum_time": 10, "maximum_tries": 3 },
            "retry": { "max_retries": 1, "base": 0.25 },
            "download": { "category": "raccoon" },
            "connectivity": { "check": false, "address": "127.0.0.1:1" }
        });
        std::fs::write(&file, body.to_string()).unwrap();

        let provider = ConfigBuilder::new().file(&file).build();
        let settings = Settings::load(&provider).await.unwrap();

        assert_eq!(settings.api_base_url, "http://127.0.0.1:4000");
        assert_eq!(settings.pacing, BackoffConfig::new(0.5, 10.0).maximum_tries(3));
        assert_eq!(settings.max_retries, 1);
        assert_eq!(settings.retry_base, 0.25);
        assert_eq!(settings.default_category, Category::Raccoon);
        assert!(!settings.check_connectivity);
        assert_eq!(settings.connectivity_address, "127.0.0.1:1");

        let retry = settings.retry_config();
        assert_eq!(retry.backoff, BackoffConfig::new(0.25, 10.0).maximum_tries(3));
    }

    #[tokio::test]
    async fn test_memory_overrides_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("settings.json");
        std::fs::write(&file, r#"{"download": {"category": "dogs"}}"#).unwrap();

        let provider = ConfigBuilder::new()
            .memory(MemoryConfigProvider::new().value("download.category", "birds"))
            .file(&file)
            .build();
        let settings = Settings::load(&provider).await.unwrap();
        assert_eq!(settings.default_category, Category::Birds);
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let provider = ConfigBuilder::new()
            .file(dir.path().join("absent.json"))
            .build();
        let settings = Settings::load(&provider).await.unwrap();
        assert_eq!(settings, Settings::default());
    }
}
