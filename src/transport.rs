//! JSON POST with a hard deadline, shared by the text and image providers.

use std::time::Duration;

use serde_json::Value;

use crate::llm::error::ProviderError;

/// An outgoing JSON request to a bearer-authenticated endpoint.
pub(crate) struct JsonPost<'a> {
    pub url: &'a str,
    pub api_key: &'a str,
    pub headers: &'a [(String, String)],
    pub body: &'a Value,
}

/// Send the request and decode a JSON body.
///
/// The whole exchange (connect, send, read) is bounded by `deadline`; past it
/// the in-flight future is dropped, which aborts the request. Non-2xx statuses
/// are classified by `ProviderError::from_status`.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    request: JsonPost<'_>,
    deadline: Duration,
) -> Result<Value, ProviderError> {
    let exchange = async {
        let mut builder = client
            .post(request.url)
            .bearer_auth(request.api_key)
            .json(request.body);
        for (name, value) in request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let text = response.text().await?;
        serde_json::from_str::<Value>(&text)
            .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {}", e)))
    };

    match tokio::time::timeout(deadline, exchange).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(deadline)),
    }
}

/// Walk `path` through nested objects/arrays and return a non-empty string.
pub(crate) fn extract_str<'v>(value: &'v Value, path: &[PathStep]) -> Option<&'v str> {
    let mut cur = value;
    for step in path {
        cur = match step {
            PathStep::Key(k) => cur.get(*k)?,
            PathStep::Index(i) => cur.get(*i)?,
        };
    }
    cur.as_str().filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum PathStep {
    Key(&'static str),
    Index(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_nested_content() {
        let body = json!({ "choices": [ { "message": { "content": "你好" } } ] });
        let path = [
            PathStep::Key("choices"),
            PathStep::Index(0),
            PathStep::Key("message"),
            PathStep::Key("content"),
        ];
        assert_eq!(extract_str(&body, &path), Some("你好"));
    }

    #[test]
    fn extract_rejects_missing_and_blank() {
        let path = [PathStep::Key("data"), PathStep::Index(0), PathStep::Key("url")];
        assert_eq!(extract_str(&json!({}), &path), None);
        assert_eq!(extract_str(&json!({ "data": [] }), &path), None);
        assert_eq!(extract_str(&json!({ "data": [ { "url": "  " } ] }), &path), None);
        assert_eq!(extract_str(&json!({ "data": [ { "url": 3 } ] }), &path), None);
    }
}
