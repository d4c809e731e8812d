//! [`FeedbackStore`] over the feedback service's HTTP API.
//!
//! ```text
//! GET    {base}/api/feedback?username=U
//! POST   {base}/api/feedback                  {promptName, feedbackData}
//! DELETE {base}/api/feedback/{prompt}?username=U
//! ```

use async_trait::async_trait;
use fonteval_core::rating::{RatingRecord, UserFeedback};
use fonteval_db::{FeedbackStore, StoreError, UpsertOutcome};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// HTTP client for one feedback service.
pub struct HttpFeedbackStore {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct DeleteOutcome {
    removed: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertBody<'a> {
    prompt_name: &'a str,
    feedback_data: &'a RatingRecord,
}

impl HttpFeedbackStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Unreachable(format!("invalid base URL '{base_url}': {e}")))?;
        Ok(Self { client, base_url })
    }

    /// `{base}/api/feedback[/{extra}]`, each segment percent-encoded.
    fn feedback_url(&self, extra: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Unreachable(format!("base URL '{}' cannot have a path", self.base_url))
            })?;
            segments.pop_if_empty().extend(["api", "feedback"]);
            if let Some(extra) = extra {
                segments.push(extra);
            }
        }
        Ok(url)
    }

    /// Return the response on 2xx, otherwise a [`StoreError::Remote`]
    /// carrying the service's `{error}` message when it sent one.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        Err(StoreError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_data<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let response = Self::ensure_success(response).await?;
        let envelope: DataEnvelope<T> = response.json().await.map_err(transport)?;
        Ok(envelope.data)
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Unreachable(e.to_string())
}

#[async_trait]
impl FeedbackStore for HttpFeedbackStore {
    async fn list_for_user(&self, username: &str) -> Result<UserFeedback, StoreError> {
        let response = self
            .client
            .get(self.feedback_url(None)?)
            .query(&[("username", username)])
            .send()
            .await
            .map_err(transport)?;
        Self::parse_data(response).await
    }

    async fn upsert(&self, record: &RatingRecord) -> Result<UpsertOutcome, StoreError> {
        let body = UpsertBody {
            prompt_name: &record.prompt_name,
            feedback_data: record,
        };
        let response = self
            .client
            .post(self.feedback_url(None)?)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        #[derive(Deserialize)]
        struct Saved {
            is_new: bool,
        }
        let saved: Saved = Self::parse_data(response).await?;
        Ok(UpsertOutcome {
            is_new: saved.is_new,
        })
    }

    async fn delete_prompt(&self, username: &str, prompt: &str) -> Result<usize, StoreError> {
        let response = self
            .client
            .delete(self.feedback_url(Some(prompt))?)
            .query(&[("username", username)])
            .send()
            .await
            .map_err(transport)?;
        let outcome: DeleteOutcome = Self::parse_data(response).await?;
        Ok(outcome.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_encoded_as_one_segment() {
        let store = HttpFeedbackStore::new("http://localhost:3001").unwrap();
        let url = store
            .feedback_url(Some("I'm looking for a font / logo?"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3001/api/feedback/I'm%20looking%20for%20a%20font%20%2F%20logo%3F"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let store = HttpFeedbackStore::new("http://example.com/eval/").unwrap();
        let url = store.feedback_url(None).unwrap();
        assert_eq!(url.as_str(), "http://example.com/eval/api/feedback");
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(HttpFeedbackStore::new("localhost without scheme").is_err());
    }
}
