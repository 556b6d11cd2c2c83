//! Forecast retrieval
//!
//! [`WeatherClient`] builds the forecast request for a position, sends it
//! through the injected [`HttpClient`], and decodes the body whichever
//! shape the transport delivered it in. Every failure is alerted and
//! returned as a [`WeatherFetchError`].

use std::sync::Arc;

use crate::config::WeatherApiConfig;
use crate::error::WeatherFetchError;
use crate::forecast::ForecastPayload;
use crate::traits::{Alert, Alerter, HttpClient, Position, ResponseBody};

/// Forecast API client
pub struct WeatherClient {
    http: Arc<dyn HttpClient>,
    alerter: Arc<dyn Alerter>,
    config: WeatherApiConfig,
}

impl WeatherClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        alerter: Arc<dyn Alerter>,
        config: WeatherApiConfig,
    ) -> Self {
        Self {
            http,
            alerter,
            config,
        }
    }

    /// Build the request URL for `position`
    ///
    /// `GET <endpoint>?lat=<lat>&lon=<lon>&appid=<key>&units=<units>`, with
    /// the key and units percent-encoded
    pub fn request_url(&self, position: &Position) -> String {
        let separator = if self.config.endpoint.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}lat={}&lon={}&appid={}&units={}",
            self.config.endpoint,
            separator,
            position.latitude,
            position.longitude,
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&self.config.units)
        )
    }

    /// Fetch the forecast for `position`
    pub async fn get_weather(&self, position: &Position) -> Result<ForecastPayload, WeatherFetchError> {
        match self.fetch(position).await {
            Ok(payload) => {
                tracing::debug!("Forecast received: {} intervals", payload.list.len());
                Ok(payload)
            }
            Err(e) => {
                tracing::warn!("Forecast fetch failed: {}", e);
                self.alerter
                    .alert(&Alert::new("Weather unavailable", e.to_string()));
                Err(e)
            }
        }
    }

    async fn fetch(&self, position: &Position) -> Result<ForecastPayload, WeatherFetchError> {
        // The key is part of the query string, so only the endpoint is logged
        tracing::debug!(
            "Requesting forecast from {} for {}, {}",
            self.config.endpoint,
            position.latitude,
            position.longitude
        );

        let response = self
            .http
            .get(&self.request_url(position))
            .await
            .map_err(|e| WeatherFetchError::Transport(e.to_string()))?;

        if !response.is_success() {
            return Err(WeatherFetchError::Status(response.status));
        }

        decode_payload(response.body)
    }
}

/// Decode a forecast body, structured or raw
fn decode_payload(body: ResponseBody) -> Result<ForecastPayload, WeatherFetchError> {
    match body {
        ResponseBody::Json(value) => serde_json::from_value(value)
            .map_err(|e| WeatherFetchError::Malformed(e.to_string())),
        ResponseBody::Text(text) => {
            serde_json::from_str(&text).map_err(|e| WeatherFetchError::Malformed(e.to_string()))
        }
        ResponseBody::Empty => Err(WeatherFetchError::Malformed("empty body".to_string())),
    }
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("http", &self.http.client_name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::HttpResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedHttp {
        response: Mutex<Option<Result<HttpResponse, crate::Error>>>,
        last_url: Mutex<Option<String>>,
    }

    impl CannedHttp {
        fn new(response: Result<HttpResponse, crate::Error>) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                last_url: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl HttpClient for CannedHttp {
        async fn get(&self, url: &str) -> Result<HttpResponse, crate::Error> {
            *self.last_url.lock().unwrap() = Some(url.to_string());
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(crate::Error::http("no canned response left")))
        }

        fn client_name(&self) -> &'static str {
            "canned"
        }
    }

    #[derive(Default)]
    struct CountingAlerter(AtomicUsize);

    impl Alerter for CountingAlerter {
        fn alert(&self, _alert: &Alert) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config() -> WeatherApiConfig {
        WeatherApiConfig {
            endpoint: "https://api.example.test/forecast".to_string(),
            api_key: "k3y".to_string(),
            ..WeatherApiConfig::default()
        }
    }

    fn body() -> serde_json::Value {
        json!({
            "cnt": 1,
            "list": [{
                "dt_txt": "2024-03-10 15:00:00",
                "main": { "temp_min": 1.0, "temp_max": 2.0 },
                "weather": [{ "description": "light rain" }],
                "rain": { "3h": 3.5 }
            }]
        })
    }

    fn client(http: Arc<CannedHttp>, alerter: Arc<CountingAlerter>) -> WeatherClient {
        WeatherClient::new(http, alerter, config())
    }

    #[test]
    fn request_url_carries_coordinates_key_and_units() {
        let http = Arc::new(CannedHttp::new(Ok(HttpResponse::json(200, body()))));
        let client = client(http, Arc::default());

        assert_eq!(
            client.request_url(&Position::new(35.5, 139.25)),
            "https://api.example.test/forecast?lat=35.5&lon=139.25&appid=k3y&units=metric"
        );
    }

    #[test]
    fn reserved_characters_in_key_and_units_are_encoded() {
        let http = Arc::new(CannedHttp::new(Ok(HttpResponse::json(200, body()))));
        let client = WeatherClient::new(
            http,
            Arc::new(CountingAlerter::default()),
            WeatherApiConfig {
                api_key: "a&b#c d".to_string(),
                units: "x=y".to_string(),
                ..config()
            },
        );

        assert_eq!(
            client.request_url(&Position::new(1.0, 2.0)),
            "https://api.example.test/forecast?lat=1&lon=2&appid=a%26b%23c%20d&units=x%3Dy"
        );
    }

    #[tokio::test]
    async fn accepts_structured_body() {
        let http = Arc::new(CannedHttp::new(Ok(HttpResponse::json(200, body()))));
        let alerter = Arc::new(CountingAlerter::default());
        let client = client(http.clone(), alerter.clone());

        let payload = client.get_weather(&Position::new(1.0, 2.0)).await.unwrap();
        assert_eq!(payload.list.len(), 1);
        assert_eq!(payload.list[0].description(), "light rain");
        assert_eq!(alerter.0.load(Ordering::SeqCst), 0);
        assert!(http.last_url.lock().unwrap().as_deref().unwrap().contains("lat=1&lon=2"));
    }

    #[tokio::test]
    async fn accepts_raw_text_body() {
        let http = Arc::new(CannedHttp::new(Ok(HttpResponse::text(200, body().to_string()))));
        let client = client(http, Arc::default());

        let payload = client.get_weather(&Position::new(1.0, 2.0)).await.unwrap();
        assert_eq!(payload.list[0].rain_volume_3h(), 3.5);
    }

    #[tokio::test]
    async fn non_success_status_is_alerted() {
        let http = Arc::new(CannedHttp::new(Ok(HttpResponse::text(401, "invalid key"))));
        let alerter = Arc::new(CountingAlerter::default());
        let client = client(http, alerter.clone());

        let err = client.get_weather(&Position::new(1.0, 2.0)).await.unwrap_err();
        assert_eq!(err, WeatherFetchError::Status(401));
        assert_eq!(alerter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_alerted() {
        let http = Arc::new(CannedHttp::new(Ok(HttpResponse::text(200, "<html>"))));
        let alerter = Arc::new(CountingAlerter::default());
        let client = client(http, alerter.clone());

        let err = client.get_weather(&Position::new(1.0, 2.0)).await.unwrap_err();
        assert!(matches!(err, WeatherFetchError::Malformed(_)));
        assert_eq!(alerter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_alerted() {
        let http = Arc::new(CannedHttp::new(Err(crate::Error::http("connection refused"))));
        let alerter = Arc::new(CountingAlerter::default());
        let client = client(http, alerter.clone());

        let err = client.get_weather(&Position::new(1.0, 2.0)).await.unwrap_err();
        assert!(matches!(err, WeatherFetchError::Transport(ref m) if m.contains("connection refused")));
        assert_eq!(alerter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_body_is_malformed() {
        let http = Arc::new(CannedHttp::new(Ok(HttpResponse {
            status: 200,
            body: ResponseBody::Empty,
        })));
        let client = client(http, Arc::default());

        let err = client.get_weather(&Position::new(1.0, 2.0)).await.unwrap_err();
        assert!(matches!(err, WeatherFetchError::Malformed(_)));
    }
}
