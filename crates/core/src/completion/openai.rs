use crate::completion::{ChatRequest, CompletionClient, CompletionError};
use crate::config::ApiKey;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// Chat-completion client for OpenAI and API-compatible servers.
#[derive(Clone)]
pub struct OpenAiCompletionClient {
    client: Client,
    base_url: Url,
}

impl OpenAiCompletionClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::InvalidResponse(format!("Failed to parse JSON: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(CompletionError::EmptyResponse)
}

impl CompletionClient for OpenAiCompletionClient {
    fn complete(
        &self,
        credential: ApiKey,
        request: ChatRequest,
    ) -> BoxFuture<'_, Result<String, CompletionError>> {
        let this = self.clone();
        async move {
            let url = this.endpoint();
            tracing::debug!(%url, model = request.model.as_str(), "sending chat completion");

            let response = this
                .client
                .post(&url)
                .bearer_auth(credential.expose())
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;

            if !status.is_success() {
                return Err(CompletionError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            parse_completion(&body)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelName;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        Url::parse(&format!("http://{addr}/v1")).expect("url")
    }

    fn request(content: &str) -> ChatRequest {
        ChatRequest::single_user(ModelName::default(), content.to_owned())
    }

    fn key() -> ApiKey {
        ApiKey::new("sk-test").expect("valid")
    }

    #[test]
    fn parses_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Bonjour\nHello"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(parse_completion(body).expect("content"), "Bonjour\nHello");
    }

    #[test]
    fn empty_choices_is_an_empty_response() {
        let err = parse_completion(r#"{"choices":[]}"#).expect_err("no choices");
        assert!(matches!(err, CompletionError::EmptyResponse));

        let err = parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#)
            .expect_err("null content");
        assert!(matches!(err, CompletionError::EmptyResponse));
    }

    #[test]
    fn malformed_body_is_invalid_response() {
        let err = parse_completion("<html>gateway</html>").expect_err("not json");
        assert!(matches!(err, CompletionError::InvalidResponse(_)));
    }

    #[test]
    fn request_body_has_one_user_message() {
        let body = serde_json::to_value(request("hi")).expect("json");
        assert_eq!(
            body,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{ "role": "user", "content": "hi" }]
            })
        );
    }

    #[tokio::test]
    async fn posts_chat_request_with_bearer_token() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if auth != "Bearer sk-test" {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" })));
                }
                let reply = format!(
                    "{}:{}",
                    body["model"].as_str().unwrap_or_default(),
                    body["messages"][0]["content"].as_str().unwrap_or_default()
                );
                (
                    StatusCode::OK,
                    Json(json!({ "choices": [{ "message": { "role": "assistant", "content": reply } }] })),
                )
            }),
        );
        let base = serve(router).await;

        let client = OpenAiCompletionClient::new(base);
        let text = client.complete(key(), request("hi")).await.expect("completion");
        assert_eq!(text, "gpt-3.5-turbo:hi");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = serve(router).await;

        let err = OpenAiCompletionClient::new(base)
            .complete(key(), request("hi"))
            .await
            .expect_err("should fail");
        match err {
            CompletionError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let base = Url::parse(&format!("http://{addr}/v1")).expect("url");
        let err = OpenAiCompletionClient::new(base)
            .complete(key(), request("hi"))
            .await
            .expect_err("should fail");
        assert!(matches!(err, CompletionError::Network(_)));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenAiCompletionClient::new(Url::parse("http://localhost:1234/v1/").expect("url"));
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/chat/completions");
    }
}
