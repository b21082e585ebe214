/// Status and body of a completed GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking GET transport used by the archive fetcher.
///
/// Errors are transport failures only; HTTP error statuses come back as
/// responses.
pub trait HttpClient {
    fn get(&self, url: &str) -> anyhow::Result<HttpResponse>;
}
