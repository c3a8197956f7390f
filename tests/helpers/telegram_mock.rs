//! Mock Telegram API Server for testing
//!
//! A wiremock server that answers the Bot API methods the bot calls.

use serde_json::{json, Value};
use teloxide::Bot;
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

/// Mock Telegram API server for testing
pub struct TelegramMockServer {
    pub server: MockServer,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    pub success: bool,
    pub delay_ms: Option<u64>,
    pub custom_response: Option<Value>,
}

impl Default for MockResponseConfig {
    fn default() -> Self {
        Self {
            success: true,
            delay_ms: None,
            custom_response: None,
        }
    }
}

impl TelegramMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Bot whose requests go to this server
    pub fn bot(&self) -> Bot {
        let url = url::Url::parse(&self.server.uri()).expect("mock server uri");
        Bot::new(test_bot_token()).set_api_url(url)
    }

    /// Setup mock for sendMessage endpoint
    pub async fn mock_send_message(&self, config: MockResponseConfig) {
        let response_body = config.custom_response.clone().unwrap_or_else(|| {
            if config.success {
                json!({
                    "ok": true,
                    "result": {
                        "message_id": 123,
                        "from": {
                            "id": 12345,
                            "is_bot": true,
                            "first_name": "TeamderBot",
                            "username": "teamder_bot"
                        },
                        "chat": {
                            "id": test_user_id(),
                            "first_name": "Player",
                            "type": "private"
                        },
                        "date": 1715342400,
                        "text": "Test message"
                    }
                })
            } else {
                json!({
                    "ok": false,
                    "error_code": 403,
                    "description": "Forbidden: bot was blocked by the user"
                })
            }
        });

        self.mount("sendMessage", &config, response_body).await;
    }

    /// Setup mock for answerCallbackQuery endpoint
    pub async fn mock_answer_callback_query(&self, config: MockResponseConfig) {
        let response_body = config.custom_response.clone().unwrap_or_else(|| {
            if config.success {
                json!({ "ok": true, "result": true })
            } else {
                json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: query is too old"
                })
            }
        });

        self.mount("answerCallbackQuery", &config, response_body).await;
    }

    async fn mount(&self, endpoint: &str, config: &MockResponseConfig, body: Value) {
        let status = if config.success { 200 } else { 403 };
        let mut response = ResponseTemplate::new(status).set_body_json(body);
        if let Some(delay) = config.delay_ms {
            response = response.set_delay(std::time::Duration::from_millis(delay));
        }

        Mock::given(method("POST"))
            .and(path_regex(format!(
                "(?i)^/bot{}/{}$",
                regex_escape(&test_bot_token()),
                endpoint
            )))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Setup all common mocks with default success responses
    pub async fn setup_default_mocks(&self) {
        let config = MockResponseConfig::default();
        self.mock_send_message(config.clone()).await;
        self.mock_answer_callback_query(config).await;
    }

    /// Setup mocks for error scenarios
    pub async fn setup_error_mocks(&self) {
        let config = MockResponseConfig {
            success: false,
            ..MockResponseConfig::default()
        };
        self.mock_send_message(config.clone()).await;
        self.mock_answer_callback_query(config).await;
    }

    /// Bodies of the requests received by one endpoint
    pub async fn requests_to(&self, endpoint: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| {
                req.url
                    .path()
                    .to_ascii_lowercase()
                    .ends_with(&endpoint.to_ascii_lowercase())
            })
            .filter_map(|req| serde_json::from_slice(&req.body).ok())
            .collect()
    }
}

/// Escape regex metacharacters in a literal path segment
fn regex_escape(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            if "\\.+*?()|[]{}^$".contains(c) {
                vec!['\\', c]
            } else {
                vec![c]
            }
        })
        .collect()
}

/// Helper function to create a test bot token
pub fn test_bot_token() -> String {
    "12345:test_token".to_string()
}

/// Helper function to create test user ID
pub fn test_user_id() -> i64 {
    987654321
}
