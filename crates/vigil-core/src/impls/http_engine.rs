//! HttpEngine - reqwest による検証バックエンド接続
//!
//! # エンドポイント
//! - `GET  {base}/datasets/{id}`          → DatasetInfo
//! - `POST {base}/datasets/{id}/validate` → Report（生の JSON）
//!
//! 非 2xx はエラーボディの `detail` をメッセージに使う（無ければ `HTTP <status>`）。
//! タイムアウトは HTTP 層のもので、コーディネーターの待ち時間とは無関係。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Value, json};
use url::Url;

use crate::domain::{DatasetInfo, RunError};
use crate::ports::{DatasetCatalog, ValidationEngine};
use crate::settings::{EngineSettings, SettingsError};

#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: Client,
    base_url: Url,
}

impl HttpEngine {
    pub fn new(settings: &EngineSettings) -> Result<Self, SettingsError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| SettingsError::Invalid {
            key: "engine.base_url",
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SettingsError::Invalid {
                key: "engine.base_url",
                reason: "must be a hierarchical http(s) url".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| SettingsError::Invalid {
                key: "engine",
                reason: format!("http client: {e}"),
            })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base` + percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RunError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RunError::transport(format!("cannot build a path on {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn dataset_url(&self, dataset_id: &str) -> Result<Url, RunError> {
        self.endpoint(&["datasets", dataset_id])
    }

    pub fn validate_url(&self, dataset_id: &str) -> Result<Url, RunError> {
        self.endpoint(&["datasets", dataset_id, "validate"])
    }
}

fn send_error(err: reqwest::Error) -> RunError {
    if err.is_timeout() {
        RunError::transport("validation request timed out")
    } else if err.is_connect() {
        RunError::transport(format!("could not reach the validation service: {err}"))
    } else {
        RunError::transport(err.to_string())
    }
}

/// The `detail` field of an error body, as the backend reports failures.
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}

async fn status_error(response: Response) -> RunError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body).unwrap_or_else(|| format!("HTTP {status}"));
    RunError::http_status(status, message)
}

#[async_trait]
impl DatasetCatalog for HttpEngine {
    async fn dataset_info(&self, dataset_id: &str) -> Result<DatasetInfo, RunError> {
        let url = self.dataset_url(dataset_id)?;
        tracing::debug!(%url, "fetching dataset metadata");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RunError::Metadata(send_error(e).to_string()))?;
        if !response.status().is_success() {
            return Err(RunError::Metadata(status_error(response).await.to_string()));
        }
        response
            .json::<DatasetInfo>()
            .await
            .map_err(|e| RunError::Metadata(format!("metadata decode: {e}")))
    }
}

#[async_trait]
impl ValidationEngine for HttpEngine {
    async fn validate(
        &self,
        dataset_id: &str,
        target_column: Option<&str>,
    ) -> Result<Value, RunError> {
        let url = self.validate_url(dataset_id)?;
        tracing::info!(%url, ?target_column, "requesting validation");
        let response = self
            .client
            .post(url)
            .json(&json!({ "targetColumn": target_column }))
            .send()
            .await
            .map_err(send_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| RunError::invalid_response(format!("body is not JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn engine(base: &str) -> HttpEngine {
        HttpEngine::new(&EngineSettings {
            base_url: base.to_string(),
            ..EngineSettings::default()
        })
        .unwrap()
    }

    #[rstest]
    #[case::plain("http://localhost:8000", "http://localhost:8000/datasets/42/validate")]
    #[case::trailing_slash("http://localhost:8000/", "http://localhost:8000/datasets/42/validate")]
    #[case::api_prefix("http://host/api/", "http://host/api/datasets/42/validate")]
    fn validate_url_joins_segments(#[case] base: &str, #[case] expected: &str) {
        assert_eq!(engine(base).validate_url("42").unwrap().as_str(), expected);
    }

    #[test]
    fn dataset_id_is_percent_encoded() {
        let url = engine("http://localhost:8000").dataset_url("my data/1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/datasets/my%20data%2F1");
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        let err = HttpEngine::new(&EngineSettings {
            base_url: "mailto:ops@example.com".to_string(),
            ..EngineSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { key: "engine.base_url", .. }));
    }

    #[rstest]
    #[case::string(r#"{"detail": "Dataset not found: 42"}"#, Some("Dataset not found: 42"))]
    #[case::structured(r#"{"detail": [{"msg": "field required"}]}"#, Some(r#"[{"msg":"field required"}]"#))]
    #[case::blank(r#"{"detail": " "}"#, None)]
    #[case::missing(r#"{"error": "x"}"#, None)]
    #[case::not_json("<html>502</html>", None)]
    fn reads_error_detail(#[case] body: &str, #[case] expected: Option<&str>) {
        assert_eq!(error_detail(body).as_deref(), expected);
    }
}
