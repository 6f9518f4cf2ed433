use std::time::Duration;

use chrono::{DateTime, Utc};
use mikiri_core::error::{MikiriError, Result};
use mikiri_core::scoring::{CandidateVerdict, ClassifyRequest, UpdateClassifier};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default per-request timeout. The classifier must never block a
/// cycle; a slow answer is treated the same as no answer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the external update classifier.
///
/// Posts the subject title and every matched candidate; expects
/// per-candidate update/no-update verdicts with confidence and
/// rationale. Wire shape is camelCase JSON.
pub struct ClassifierClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ClassifierClient {
    /// A client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::Classifier` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// A client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::Classifier` if the underlying HTTP client
    /// cannot be constructed.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| MikiriError::Classifier(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    subject: &'a str,
    context: Option<&'a str>,
    candidates: Vec<WireCandidate<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate<'a> {
    title: &'a str,
    similarity: f32,
    link: &'a str,
    date: Option<DateTime<Utc>>,
}

impl<'a> WireRequest<'a> {
    fn from_request(req: &'a ClassifyRequest) -> Self {
        Self {
            subject: &req.subject,
            context: req.context.as_deref(),
            candidates: req
                .candidates
                .iter()
                .map(|c| WireCandidate {
                    title: &c.title,
                    similarity: c.similarity,
                    link: &c.link,
                    date: c.date,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVerdict {
    is_update: bool,
    confidence: f32,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    verdicts: Vec<WireVerdict>,
}

impl UpdateClassifier for ClassifierClient {
    async fn classify(&self, req: &ClassifyRequest) -> Result<Vec<CandidateVerdict>> {
        debug!(
            subject = %req.subject,
            candidates = req.candidates.len(),
            "submitting candidates to classifier"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&WireRequest::from_request(req))
            .send()
            .await
            .map_err(|err| MikiriError::Classifier(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MikiriError::Classifier(format!(
                "classifier answered {status}"
            )));
        }

        let body: WireResponse = response
            .json()
            .await
            .map_err(|err| MikiriError::Classifier(format!("malformed verdict body: {err}")))?;

        Ok(body
            .verdicts
            .into_iter()
            .map(|v| CandidateVerdict {
                is_update: v.is_update,
                confidence: v.confidence.clamp(0.0, 1.0),
                reason: v.reason,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use mikiri_core::scoring::ClassifyCandidate;

    use super::*;

    #[test]
    fn request_wire_shape_is_camel_case() {
        let req = ClassifyRequest {
            subject: "Game Name".into(),
            context: Some("current release: v1.0".into()),
            candidates: vec![ClassifyCandidate {
                title: "Game Name v1.1-CODEX".into(),
                similarity: 1.0,
                link: "https://b/post".into(),
                date: None,
            }],
        };

        let json = serde_json::to_value(WireRequest::from_request(&req)).unwrap();
        assert_eq!(json["subject"], "Game Name");
        assert_eq!(json["candidates"][0]["similarity"], 1.0);
        assert!(json["candidates"][0].get("link").is_some());
    }

    #[test]
    fn response_wire_shape_parses() {
        let body = r#"{"verdicts":[{"isUpdate":true,"confidence":0.92,"reason":"newer version"},{"isUpdate":false,"confidence":0.8}]}"#;
        let parsed: WireResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.verdicts.len(), 2);
        assert!(parsed.verdicts[0].is_update);
        assert_eq!(parsed.verdicts[1].reason, None);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let verdict = WireVerdict {
            is_update: true,
            confidence: 1.7,
            reason: None,
        };
        let mapped = CandidateVerdict {
            is_update: verdict.is_update,
            confidence: verdict.confidence.clamp(0.0, 1.0),
            reason: verdict.reason,
        };
        assert_eq!(mapped.confidence, 1.0);
    }

    #[test]
    fn client_construction_succeeds() {
        assert!(ClassifierClient::new("http://localhost:9090/classify").is_ok());
        assert!(
            ClassifierClient::with_timeout("http://localhost:9090/classify", Duration::from_secs(2))
                .is_ok()
        );
    }
}
