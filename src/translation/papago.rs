//! Papago web translator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::translation::{Translate, TranslateError};

#[derive(Serialize)]
struct PapagoRequest<'a> {
    source: &'a str,
    target: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PapagoResponse {
    translated_text: String,
}

/// Form-encoded client for the Papago n2mt endpoint.
#[derive(Debug, Clone)]
pub struct Papago {
    client: reqwest::Client,
    url: String,
    source: String,
    target: String,
}

impl Papago {
    pub fn new(url: &str, source: &str, target: &str, timeout: Duration) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        })
    }
}

impl Translate for Papago {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let data = serde_json::to_string(&PapagoRequest {
            source: &self.source,
            target: &self.target,
            text,
        })
        .map_err(|e| TranslateError::Decode(e.to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .form(&[("data", data.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let payload: PapagoResponse =
            serde_json::from_slice(&body).map_err(|e| TranslateError::Decode(e.to_string()))?;
        Ok(payload.translated_text)
    }
}
