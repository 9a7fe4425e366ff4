//! Integration tests for the informers client and the weather view using wiremock.
//!
//! These tests mock the Yandex.Weather API to verify request shape, error
//! handling and the keep-last-good-data behaviour without real API calls.

use std::{io, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};
use yandex_weather_core::{
    Condition, Coordinates, FetchError, UpdateOutcome, WeatherProvider, WeatherView, YandexClient,
};

// =============================================================================
// Test Helpers
// =============================================================================

const API_KEY: &str = "test-api-key";

fn client_for(server: &MockServer) -> YandexClient {
    YandexClient::new(
        Coordinates::new(55.75, 37.62),
        API_KEY.to_string(),
        reqwest::Client::new(),
    )
    .with_base_url(server.uri())
}

/// Sample informers success body
fn informers_body(temp: i64) -> serde_json::Value {
    serde_json::json!({
        "now": 1700000100,
        "now_dt": "2023-11-14T22:15:00Z",
        "info": { "lat": 55.75, "lon": 37.62, "url": "https://yandex.ru/pogoda/" },
        "fact": {
            "temp": temp,
            "feels_like": 18,
            "icon": "skc-d",
            "condition": "clear",
            "wind_speed": 3,
            "wind_gust": 6.4,
            "wind_dir": "nw",
            "pressure_mm": 759,
            "pressure_pa": 1012,
            "humidity": 55,
            "daytime": "d",
            "polar": false,
            "season": "autumn",
            "obs_time": 1700000000
        },
        "forecast": {
            "date": "2023-11-14",
            "date_ts": 1699909200,
            "week": 46,
            "sunrise": "07:32",
            "sunset": "16:21",
            "moon_code": 3,
            "moon_text": "moon-code-3",
            "parts": [
                {
                    "part_name": "night",
                    "temp_min": 1,
                    "temp_max": 4,
                    "temp_avg": 2,
                    "feels_like": -2,
                    "icon": "ovc",
                    "condition": "overcast",
                    "daytime": "n",
                    "polar": false,
                    "wind_speed": 2.5,
                    "wind_gust": 5.8,
                    "wind_dir": "sw",
                    "pressure_mm": 758,
                    "pressure_pa": 1010,
                    "humidity": 88,
                    "prec_mm": 0,
                    "prec_period": 360,
                    "prec_prob": 10
                },
                {
                    "part_name": "morning",
                    "temp_min": 2,
                    "temp_max": 5,
                    "condition": "wet-snow",
                    "prec_mm": 1.2,
                    "prec_prob": 60
                }
            ]
        }
    })
}

/// Sample provider error body
fn provider_error_body(status: i64, message: &str) -> serde_json::Value {
    serde_json::json!({ "status": status, "message": message })
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    (buffer, tracing::subscriber::set_default(subscriber))
}

/// Serves one informers reply, then closes the next connection unanswered.
async fn serve_once_then_hang_up() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }

        let body = informers_body(20).to_string();
        let reply = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        drop(socket);

        let (socket, _) = listener.accept().await.unwrap();
        drop(socket);
    });

    format!("http://{addr}")
}

async fn mount_success(server: &MockServer, temp: i64) {
    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(informers_body(temp)))
        .mount(server)
        .await;
}

// =============================================================================
// Client Tests
// =============================================================================

#[tokio::test]
async fn test_fetch_sends_key_header_and_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .and(header("X-Yandex-API-Key", API_KEY))
        .and(query_param("lat", "55.75"))
        .and(query_param("lon", "37.62"))
        .respond_with(ResponseTemplate::new(200).set_body_json(informers_body(20)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.fetch().await.unwrap();

    let current = client.current().unwrap();
    assert_eq!(current.temp, Some(20.0));
    assert_eq!(current.condition.as_deref(), Some("clear"));
    assert_eq!(current.obs_time, Some(1_700_000_000));

    let forecast = client.forecast().unwrap();
    assert_eq!(forecast.parts.len(), 2);
    assert_eq!(forecast.parts[0].part_name.as_deref(), Some("night"));
    assert_eq!(forecast.sunrise.as_deref(), Some("07:32"));
}

#[tokio::test]
async fn test_accessors_absent_before_first_fetch() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    assert!(client.snapshot().is_none());
    assert!(client.current().is_none());
    assert!(client.forecast().is_none());
}

#[tokio::test]
async fn test_provider_error_keeps_previous_fragments() {
    let server = MockServer::start().await;
    mount_success(&server, 20).await;

    let client = client_for(&server);
    client.fetch().await.unwrap();
    let before = client.snapshot().unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(403).set_body_json(provider_error_body(403, "Forbidden")))
        .mount(&server)
        .await;

    let err = client.fetch().await.unwrap_err();
    match &err {
        FetchError::Provider { status, message } => {
            assert_eq!(status, "403");
            assert_eq!(message, "Forbidden");
        }
        other => panic!("expected provider error, got {other:?}"),
    }

    let after = client.snapshot().unwrap();
    assert_eq!(*before, *after);
}

#[tokio::test]
async fn test_provider_error_on_http_200_is_still_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_error_body(429, "Too Many Requests")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch().await.unwrap_err();

    assert_eq!(err.kind(), "provider");
    assert!(client.snapshot().is_none());
}

#[tokio::test]
async fn test_null_status_is_still_a_provider_error() {
    let server = MockServer::start().await;
    mount_success(&server, 20).await;

    let client = client_for(&server);
    client.fetch().await.unwrap();
    let before = client.snapshot().unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": null,
            "message": "err",
            "fact": { "temp": 1 }
        })))
        .mount(&server)
        .await;

    let err = client.fetch().await.unwrap_err();
    match &err {
        FetchError::Provider { status, message } => {
            assert_eq!(status, "null");
            assert_eq!(message, "err");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
    assert_eq!(*client.snapshot().unwrap(), *before);
}

#[tokio::test]
async fn test_provider_error_is_logged_with_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(403).set_body_json(provider_error_body(403, "Forbidden")))
        .mount(&server)
        .await;

    let (logs, _guard) = capture_logs();
    let client = client_for(&server);
    client.fetch().await.unwrap_err();

    let out = logs.contents();
    assert!(out.contains("ERROR"), "logs: {out}");
    assert!(out.contains("Error fetching data from Yandex.Weather"), "logs: {out}");
    assert!(out.contains("kind=\"provider\""), "logs: {out}");
    assert!(out.contains("status=403"), "logs: {out}");
    assert!(out.contains("provider_message=Forbidden"), "logs: {out}");
}

#[tokio::test]
async fn test_null_forecast_parts_do_not_drop_current_conditions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fact": { "temp": 1 },
            "forecast": { "parts": null }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.fetch().await.unwrap();

    assert_eq!(client.current().unwrap().temp, Some(1.0));
    assert!(client.forecast().unwrap().parts.is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch().await.unwrap_err();

    assert!(matches!(err, FetchError::Decode { http_status: 502, .. }));
    assert!(client.current().is_none());
}

#[tokio::test]
async fn test_slow_response_times_out_and_keeps_fragments() {
    let server = MockServer::start().await;
    mount_success(&server, 20).await;

    let client = client_for(&server).with_timeout(Duration::from_millis(200));
    client.fetch().await.unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(informers_body(-5))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)));
    assert_eq!(client.current().unwrap().temp, Some(20.0));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Nothing listens on the discard port.
    let client = YandexClient::new(
        Coordinates::new(55.75, 37.62),
        API_KEY.to_string(),
        reqwest::Client::new(),
    )
    .with_base_url("http://127.0.0.1:9");

    let err = client.fetch().await.unwrap_err();
    assert_eq!(err.kind(), "transport");
    assert!(client.snapshot().is_none());
}

#[tokio::test]
async fn test_transport_error_keeps_previous_fragments() {
    let base_url = serve_once_then_hang_up().await;
    let client = YandexClient::new(
        Coordinates::new(55.75, 37.62),
        API_KEY.to_string(),
        reqwest::Client::new(),
    )
    .with_base_url(base_url);

    client.fetch().await.unwrap();
    let before = client.snapshot().unwrap();

    let (logs, _guard) = capture_logs();
    let err = client.fetch().await.unwrap_err();

    assert_eq!(err.kind(), "transport");
    assert_eq!(*client.snapshot().unwrap(), *before);
    assert_eq!(client.current().unwrap().temp, Some(20.0));
    assert!(logs.contents().contains("kind=\"transport\""));
}

#[tokio::test]
async fn test_success_replaces_both_fragments_together() {
    let server = MockServer::start().await;
    mount_success(&server, 20).await;

    let client = client_for(&server);
    client.fetch().await.unwrap();
    assert!(client.forecast().is_some());

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fact": { "temp": 7, "condition": "rain" }
        })))
        .mount(&server)
        .await;

    client.fetch().await.unwrap();

    assert_eq!(client.current().unwrap().temp, Some(7.0));
    assert!(client.forecast().is_none());
}

// =============================================================================
// View Tests
// =============================================================================

#[tokio::test]
async fn test_view_reports_normalized_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fact": {
                "temp": 20,
                "humidity": 55,
                "wind_speed": 3,
                "condition": "clear",
                "obs_time": 1700000000
            }
        })))
        .mount(&server)
        .await;

    let view = WeatherView::new("Yandex Weather", client_for(&server));
    assert!(!view.available());

    assert_eq!(view.update().await, UpdateOutcome::Fetched);

    assert!(view.available());
    assert_eq!(view.condition(), Some(Condition::Sunny));
    assert_eq!(view.native_temperature(), Some(20.0));
    assert_eq!(view.humidity(), Some(55.0));
    assert_eq!(view.native_wind_speed(), Some(3.0));
    assert_eq!(view.native_pressure(), None);
    assert_eq!(view.forecast(), None);
}

#[tokio::test]
async fn test_view_update_twice_makes_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(informers_body(20)))
        .expect(1)
        .mount(&server)
        .await;

    let view = WeatherView::new("Yandex Weather", client_for(&server));

    assert_eq!(view.update().await, UpdateOutcome::Fetched);
    assert_eq!(view.update().await, UpdateOutcome::Throttled);

    let forecast = view.forecast().unwrap();
    assert_eq!(forecast[0].condition, Condition::Cloudy);
    assert_eq!(forecast[1].condition, Condition::SnowyRainy);
    assert!(forecast[0].datetime.is_some());
    assert!(forecast[1].datetime.is_some());
}

#[tokio::test]
async fn test_view_update_never_fails_outward() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/informers"))
        .respond_with(ResponseTemplate::new(403).set_body_json(provider_error_body(403, "Forbidden")))
        .mount(&server)
        .await;

    let view = WeatherView::new("Yandex Weather", client_for(&server));

    assert_eq!(view.update().await, UpdateOutcome::Failed);
    assert!(!view.available());
    assert!(view.attributes().is_none());
}
