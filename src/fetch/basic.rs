use anyhow::Result;
use reqwest::blocking::Client;

use super::client::{HttpClient, HttpResponse};
use crate::config::ArchiveConfig;

/// [`HttpClient`] backed by a blocking reqwest client.
pub struct BasicClient(Client);

impl BasicClient {
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self(client))
    }
}

impl HttpClient for BasicClient {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let resp = self.0.get(url).send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(HttpResponse { status, body })
    }
}
