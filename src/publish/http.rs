//! HTTP publisher: multipart POST to a configured endpoint

use super::{PublishReceipt, PublishService};
use crate::compression::resolve_spooled;
use crate::config::PublishConfig;
use crate::error::PublishError;
use crate::types::{DraftMedia, DraftRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Longest response body carried into an error message
const MAX_ERROR_BODY_LEN: usize = 512;

/// Publishes drafts as `multipart/form-data`
///
/// The form carries a `draft` part with the record serialized as JSON and,
/// when the draft has media, a `media` file part read from the spooled
/// payload. The draft id is sent as an `Idempotency-Key` header so the
/// service can deduplicate a retried attempt.
///
/// A 2xx response is success; a JSON body with an `id` (or `remoteId`) field
/// is surfaced as the receipt's remote id.
///
/// With a media root set, only payloads that resolve inside it are read;
/// any other reference fails the attempt with
/// [`PublishError::MediaUnavailable`].
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: Url,
    auth_header: Option<String>,
    media_root: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(default, alias = "remoteId")]
    id: Option<serde_json::Value>,
}

impl HttpPublisher {
    /// Create a publisher posting to `endpoint`
    pub fn new(endpoint: Url, timeout: Duration, auth_header: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            auth_header,
            media_root: None,
        })
    }

    /// Only read media payloads that live inside `dir`
    pub fn with_media_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.media_root = Some(dir.into());
        self
    }

    /// Create a publisher from configuration, `None` when no endpoint is set
    ///
    /// Media is only read from `media_dir`.
    pub fn from_config(config: &PublishConfig, media_dir: &Path) -> Result<Option<Self>> {
        match &config.endpoint {
            Some(endpoint) => Self::new(
                endpoint.clone(),
                config.timeout,
                config.auth_header.clone(),
            )
            .map(|publisher| Some(publisher.with_media_root(media_dir))),
            None => Ok(None),
        }
    }

    /// Endpoint drafts are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn build_form(&self, draft: &DraftRecord) -> std::result::Result<Form, PublishError> {
        let json = serde_json::to_string(draft)
            .map_err(|e| PublishError::Other(format!("failed to serialize draft: {}", e)))?;
        let draft_part = Part::text(json)
            .mime_str("application/json")
            .map_err(|e| PublishError::Other(e.to_string()))?;

        let mut form = Form::new().part("draft", draft_part);

        if let Some(media) = &draft.media {
            form = form.part("media", media_part(media, self.media_root.as_deref()).await?);
        }

        Ok(form)
    }
}

async fn media_part(
    media: &DraftMedia,
    media_root: Option<&Path>,
) -> std::result::Result<Part, PublishError> {
    let resolved = match media_root {
        Some(root) => resolve_spooled(root, &media.reference).await.ok_or_else(|| {
            PublishError::MediaUnavailable {
                reference: media.reference.clone(),
                reason: format!("not a payload in {}", root.display()),
            }
        })?,
        None => PathBuf::from(&media.reference),
    };
    let path = resolved.as_path();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PublishError::MediaUnavailable {
            reference: media.reference.clone(),
            reason: e.to_string(),
        })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("media.{}", media.kind.extension()));
    let mime = mime_for(path).unwrap_or(media.kind.output_mime());

    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|e| PublishError::Other(e.to_string()))
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "mp4" => Some("video/mp4"),
        _ => None,
    }
}

#[async_trait]
impl PublishService for HttpPublisher {
    async fn publish(
        &self,
        draft: &DraftRecord,
    ) -> std::result::Result<PublishReceipt, PublishError> {
        let form = self.build_form(draft).await?;

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("Idempotency-Key", draft.id.to_string())
            .multipart(form);
        if let Some(auth) = &self.auth_header {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(|e| {
            let msg = if e.is_timeout() {
                format!("timed out posting to {}", self.endpoint)
            } else if e.is_connect() {
                format!("connection failed for {}: {}", self.endpoint, e)
            } else {
                format!("request to {} failed: {}", self.endpoint, e)
            };
            PublishError::Network(msg)
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let mut message = body.trim().to_string();
            if message.len() > MAX_ERROR_BODY_LEN {
                let mut cut = MAX_ERROR_BODY_LEN;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            if message.is_empty() {
                message = status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string();
            }
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let remote_id = serde_json::from_str::<PublishResponse>(&body)
            .ok()
            .and_then(|r| r.id)
            .and_then(|id| match id {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        tracing::debug!(draft_id = %draft.id, ?remote_id, "draft published");

        Ok(PublishReceipt { remote_id })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaKind, NewDraft};
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher_for(server: &MockServer, auth: Option<&str>) -> HttpPublisher {
        let endpoint = Url::parse(&format!("{}/posts", server.uri())).unwrap();
        HttpPublisher::new(
            endpoint,
            Duration::from_secs(5),
            auth.map(str::to_string),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn success_returns_remote_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(header_exists("Idempotency-Key"))
            .and(body_string_contains("hello world"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "p-42"})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = publisher_for(&server, None);
        let draft = DraftRecord::new(NewDraft::text("hello world"));

        let receipt = publisher.publish(&draft).await.unwrap();
        assert_eq!(receipt.remote_id.as_deref(), Some("p-42"));
    }

    #[tokio::test]
    async fn numeric_id_and_empty_body_are_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"remoteId": 7})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let publisher = publisher_for(&server, None);
        let draft = DraftRecord::new(NewDraft::text("x"));

        let first = publisher.publish(&draft).await.unwrap();
        assert_eq!(first.remote_id.as_deref(), Some("7"));

        let second = publisher.publish(&draft).await.unwrap();
        assert_eq!(second, PublishReceipt::default());
    }

    #[tokio::test]
    async fn rejection_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("content too long"))
            .mount(&server)
            .await;

        let publisher = publisher_for(&server, None);
        let err = publisher
            .publish(&DraftRecord::new(NewDraft::text("x")))
            .await
            .unwrap_err();

        match err {
            PublishError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "content too long");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_rejection_body_uses_reason_phrase() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = publisher_for(&server, None)
            .publish(&DraftRecord::new(NewDraft::text("x")))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "rejected with status 503: Service Unavailable"
        );
    }

    #[tokio::test]
    async fn auth_header_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        publisher_for(&server, Some("Bearer secret"))
            .publish(&DraftRecord::new(NewDraft::text("x")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn media_part_is_attached() {
        let dir = tempfile::tempdir().unwrap();
        let media_path = dir.path().join("abc.jpg");
        std::fs::write(&media_path, b"JPEGDATA-marker").unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("JPEGDATA-marker"))
            .and(body_string_contains("filename=\"abc.jpg\""))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let draft = DraftRecord::new(NewDraft {
            content: "with photo".to_string(),
            media: Some(DraftMedia {
                reference: media_path.to_string_lossy().into_owned(),
                kind: MediaKind::Image,
                size_bytes: 15,
            }),
            ..Default::default()
        });

        publisher_for(&server, None).publish(&draft).await.unwrap();
    }

    #[tokio::test]
    async fn missing_media_file_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let draft = DraftRecord::new(NewDraft {
            media: Some(DraftMedia {
                reference: "/nonexistent/draft-sync/missing.jpg".to_string(),
                kind: MediaKind::Image,
                size_bytes: 0,
            }),
            ..Default::default()
        });

        let err = publisher_for(&server, None)
            .publish(&draft)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::MediaUnavailable { .. }));
    }

    #[tokio::test]
    async fn media_outside_root_is_never_read() {
        let dir = tempfile::tempdir().unwrap();
        let media_dir = dir.path().join("media");
        std::fs::create_dir_all(&media_dir).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"SECRET-marker").unwrap();
        std::fs::write(media_dir.join("ok.jpg"), b"JPEGDATA-marker").unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("JPEGDATA-marker"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = publisher_for(&server, None).with_media_root(&media_dir);
        let draft_with = |reference: PathBuf| {
            DraftRecord::new(NewDraft {
                media: Some(DraftMedia {
                    reference: reference.to_string_lossy().into_owned(),
                    kind: MediaKind::Image,
                    size_bytes: 13,
                }),
                ..Default::default()
            })
        };

        let err = publisher
            .publish(&draft_with(media_dir.join("..").join("secret.txt")))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::MediaUnavailable { .. }));

        publisher
            .publish(&draft_with(media_dir.join("ok.jpg")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let publisher = HttpPublisher::new(
            Url::parse("http://127.0.0.1:9/posts").unwrap(),
            Duration::from_secs(2),
            None,
        )
        .unwrap();

        let err = publisher
            .publish(&DraftRecord::new(NewDraft::text("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Network(_)));
    }

    #[test]
    fn from_config_without_endpoint_is_none() {
        let publisher =
            HttpPublisher::from_config(&PublishConfig::default(), Path::new("media")).unwrap();
        assert!(publisher.is_none());
    }

    #[test]
    fn mime_is_derived_from_extension() {
        assert_eq!(mime_for(Path::new("/m/a.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for(Path::new("/m/a.png")), Some("image/png"));
        assert_eq!(mime_for(Path::new("/m/a.mp4")), Some("video/mp4"));
        assert_eq!(mime_for(Path::new("/m/a")), None);
    }
}
