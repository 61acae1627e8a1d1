use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use url::Url;

use crate::dispatch::{MoodEvent, MoodTransport, MOOD_ENDPOINT_PATH};
use crate::error::{DispatchError, StartupError};

/// Blocking JSON POST to `<server>/api/mood`. Only `200 OK` counts as delivered.
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(server_url: &Url, timeout: Duration) -> Result<Self, StartupError> {
        let endpoint = endpoint_url(server_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| StartupError::HttpClient(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl MoodTransport for HttpTransport {
    fn send(&self, event: &MoodEvent) -> Result<(), DispatchError> {
        let response = self.client.post(self.endpoint.clone()).json(event).send()?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(DispatchError::Status(status.as_u16())),
        }
    }
}

/// Joins the mood path onto the server URL, keeping any path prefix the
/// server URL already has.
pub fn endpoint_url(server_url: &Url) -> Result<Url, StartupError> {
    let base = server_url.as_str().trim_end_matches('/');
    Url::parse(&format!("{}{}", base, MOOD_ENDPOINT_PATH))
        .map_err(|e| StartupError::Config(format!("invalid server url {}: {}", server_url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_bare_host() {
        let server = Url::parse("http://localhost:5000").unwrap();
        assert_eq!(
            endpoint_url(&server).unwrap().as_str(),
            "http://localhost:5000/api/mood"
        );
    }

    #[test]
    fn test_endpoint_keeps_prefix() {
        let server = Url::parse("https://example.org/monitor/").unwrap();
        assert_eq!(
            endpoint_url(&server).unwrap().as_str(),
            "https://example.org/monitor/api/mood"
        );
    }
}
