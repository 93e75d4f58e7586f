use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::TextConverter;
use crate::app_config::TextConversionConfig;
use crate::errors::ProviderError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

/// Client for the zhconvert conversion API
#[derive(Debug, Clone)]
pub struct ZhConvert {
    /// Full URL of the convert endpoint
    endpoint: String,
    /// Converter name, `China` for simplified Chinese
    converter: String,
    /// HTTP client for making requests
    client: Client,
}

/// Convert request body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    /// Text to convert
    pub text: String,
    /// Target converter
    pub converter: String,
    /// JSON-encoded module switches
    pub modules: String,
    pub jp_text_conversion_strategy: String,
    pub jp_style_conversion_strategy: bool,
    pub diff_enable: bool,
    pub output_format: String,
}

impl ConvertRequest {
    pub fn new(text: impl Into<String>, converter: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            converter: converter.into(),
            modules: r#"{"ChineseVariant":"1"}"#.to_string(),
            jp_text_conversion_strategy: "none".to_string(),
            jp_style_conversion_strategy: false,
            diff_enable: false,
            output_format: "json".to_string(),
        }
    }
}

/// Convert response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertResponse {
    /// 0 on success
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Option<ConvertData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertData {
    pub text: String,
}

impl ZhConvert {
    /// Create a client from the text-conversion settings
    pub fn from_config(config: &TextConversionConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT);

        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| ProviderError::ConnectionError(format!("Invalid proxy '{}': {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            converter: config.converter.clone(),
            client,
        })
    }

    /// Send one convert request and unwrap the service envelope
    pub async fn complete(&self, request: ConvertRequest) -> Result<ConvertResponse, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("accept", "application/json, text/plain, */*")
            .header("origin", "http://zhconvert.org")
            .header("referer", "http://zhconvert.org/")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else if e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("zhconvert API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let body = response
            .json::<ConvertResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if body.code != 0 {
            return Err(ProviderError::ServiceError {
                code: body.code,
                message: if body.msg.is_empty() { "Unknown error".to_string() } else { body.msg },
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl TextConverter for ZhConvert {
    async fn convert(&self, text: &str) -> Result<String, ProviderError> {
        debug!("Sending {} chars to {}", text.chars().count(), self.endpoint);
        let response = self.complete(ConvertRequest::new(text, self.converter.as_str())).await?;

        response
            .data
            .map(|data| data.text)
            .ok_or_else(|| ProviderError::ParseError("response has no data.text".to_string()))
    }

    fn name(&self) -> &str {
        "zhconvert"
    }
}
