// # HTTP Client Trait
//
// Defines the transport used by the weather client.
//
// ## Implementations
//
// - reqwest: `skycache-http` crate
//
// ## Usage
//
// ```rust,ignore
// use skycache_core::HttpClient;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* HttpClient implementation */;
//
//     let response = client.get("https://api.example.com/forecast?lat=1&lon=2").await?;
//     if response.is_success() {
//         println!("{:?}", response.body);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Body of an HTTP response
///
/// Some transports deserialize JSON bodies on their own, others hand back
/// the raw text. Consumers must accept both shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body already decoded as JSON by the transport
    Json(serde_json::Value),
    /// Raw body text
    Text(String),
    /// No body
    Empty,
}

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: ResponseBody,
}

impl HttpResponse {
    /// Create a response with a JSON body
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            body: ResponseBody::Json(value),
        }
    }

    /// Create a response with a raw text body
    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Text(text.into()),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP transport implementations
///
/// Implementations perform exactly one request per call. They report
/// transport failures as `Err` and hand back every status code, including
/// non-2xx ones, as `Ok(HttpResponse)`: deciding what a status means is
/// the caller's job.
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request
    ///
    /// # Parameters
    ///
    /// - `url`: Fully-built request URL including query string
    ///
    /// # Returns
    ///
    /// - `Ok(HttpResponse)`: A response was received (any status)
    /// - `Err(Error)`: The request could not be completed
    async fn get(&self, url: &str) -> Result<HttpResponse, crate::Error>;

    /// Get the client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}
