//! Ingestion relay client
//!
//! Forwards uploaded court documents to the webhook automation service as a
//! multipart POST. The automation service stores the files, extracts the
//! metadata and writes rows back through `POST /api/ingest`.
//!
//! Three upload flows share one webhook, told apart by the `uploadType` field:
//! - `order-bundle`: court order and/or case status file for an existing or
//!   new case number (PDF or image)
//! - `case-status`: a single PDF starting a brand new case
//! - `follow-up`: a single PDF attached to a known case
//!
//! No automatic retry; a failed relay surfaces as a retryable error.

use chrono::{DateTime, Utc};
use cmon_common::time::file_stamp;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-file upload limit
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Extensions accepted in an order bundle
const BUNDLE_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

const PDF_MIME: &str = "application/pdf";

/// Relay client errors
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing or inconsistent form fields
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("{file_name} is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge {
        file_name: String,
        size: usize,
        limit: usize,
    },

    #[error("Unsupported file {file_name}: {reason}")]
    UnsupportedFile { file_name: String, reason: String },

    /// Connect failure, timeout or broken response
    #[error("Relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Automation service answered with a non-2xx status
    #[error("Relay returned {status}: {body}")]
    Server { status: u16, body: String },
}

impl RelayError {
    /// True when the upload itself is at fault (maps to 400)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::InvalidUpload(_)
                | RelayError::FileTooLarge { .. }
                | RelayError::UnsupportedFile { .. }
        )
    }
}

/// Kind of follow-up document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Order,
    Reply,
    Disposal,
    Notice,
    Affidavit,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Order => "order",
            DocumentType::Reply => "reply",
            DocumentType::Disposal => "disposal",
            DocumentType::Notice => "notice",
            DocumentType::Affidavit => "affidavit",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(DocumentType::Order),
            "reply" => Ok(DocumentType::Reply),
            "disposal" => Ok(DocumentType::Disposal),
            "notice" => Ok(DocumentType::Notice),
            "affidavit" => Ok(DocumentType::Affidavit),
            "other" => Ok(DocumentType::Other),
            other => Err(RelayError::InvalidUpload(format!(
                "unknown documentType '{}'",
                other
            ))),
        }
    }
}

/// One uploaded file held in memory
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Lowercased text after the last `.`, if any
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    pub fn is_pdf(&self) -> bool {
        match self.content_type.as_deref() {
            Some(mime) => mime == PDF_MIME,
            None => self.extension().as_deref() == Some("pdf"),
        }
    }

    fn mime(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    fn check_size(&self) -> Result<(), RelayError> {
        if self.bytes.len() > MAX_FILE_BYTES {
            return Err(RelayError::FileTooLarge {
                file_name: self.file_name.clone(),
                size: self.bytes.len(),
                limit: MAX_FILE_BYTES,
            });
        }
        Ok(())
    }

    fn require_pdf(&self) -> Result<(), RelayError> {
        if !self.is_pdf() {
            return Err(RelayError::UnsupportedFile {
                file_name: self.file_name.clone(),
                reason: "a PDF file is required".to_string(),
            });
        }
        Ok(())
    }
}

/// An upload as received from the user
#[derive(Debug, Clone)]
pub enum UploadRequest {
    OrderBundle {
        case_number: Option<String>,
        court_order: Option<UploadFile>,
        case_status: Option<UploadFile>,
    },
    NewCase {
        file: UploadFile,
    },
    FollowUp {
        case_id: Uuid,
        case_number: String,
        document_type: DocumentType,
        file: UploadFile,
    },
}

impl UploadRequest {
    /// Build a request from decoded multipart fields
    ///
    /// `uploadType` selects the flow and defaults to `order-bundle`. Files are
    /// keyed by form field name (`courtOrder`, `caseStatus`, `file`).
    pub fn from_form(
        mut text: HashMap<String, String>,
        mut files: HashMap<String, UploadFile>,
    ) -> Result<Self, RelayError> {
        let upload_type = text
            .remove("uploadType")
            .unwrap_or_else(|| UPLOAD_ORDER_BUNDLE.to_string());

        match upload_type.as_str() {
            UPLOAD_ORDER_BUNDLE => Ok(UploadRequest::OrderBundle {
                case_number: text.remove("caseNumber"),
                court_order: files.remove("courtOrder"),
                case_status: files.remove("caseStatus"),
            }),
            UPLOAD_NEW_CASE => {
                let file = files
                    .remove("file")
                    .ok_or_else(|| RelayError::InvalidUpload("missing file".to_string()))?;
                Ok(UploadRequest::NewCase { file })
            }
            UPLOAD_FOLLOW_UP => {
                let file = files
                    .remove("file")
                    .ok_or_else(|| RelayError::InvalidUpload("missing file".to_string()))?;
                let case_id = text
                    .remove("caseId")
                    .ok_or_else(|| RelayError::InvalidUpload("missing caseId".to_string()))?;
                let case_id = Uuid::parse_str(case_id.trim()).map_err(|e| {
                    RelayError::InvalidUpload(format!("invalid caseId '{}': {}", case_id, e))
                })?;
                let document_type = text
                    .remove("documentType")
                    .ok_or_else(|| RelayError::InvalidUpload("missing documentType".to_string()))?
                    .parse::<DocumentType>()?;
                Ok(UploadRequest::FollowUp {
                    case_id,
                    case_number: text.remove("caseNumber").unwrap_or_default(),
                    document_type,
                    file,
                })
            }
            other => Err(RelayError::InvalidUpload(format!(
                "unknown uploadType '{}'",
                other
            ))),
        }
    }

    pub fn upload_type(&self) -> &'static str {
        match self {
            UploadRequest::OrderBundle { .. } => UPLOAD_ORDER_BUNDLE,
            UploadRequest::NewCase { .. } => UPLOAD_NEW_CASE,
            UploadRequest::FollowUp { .. } => UPLOAD_FOLLOW_UP,
        }
    }
}

pub const UPLOAD_ORDER_BUNDLE: &str = "order-bundle";
pub const UPLOAD_NEW_CASE: &str = "case-status";
pub const UPLOAD_FOLLOW_UP: &str = "follow-up";

#[derive(Debug, Clone)]
pub struct PreparedFile {
    pub field: &'static str,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Validated multipart payload, ready to send
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub upload_type: &'static str,
    pub text_fields: Vec<(&'static str, String)>,
    pub files: Vec<PreparedFile>,
    /// Case number (or generated folder name) the upload is filed under
    pub case_number: Option<String>,
    /// Storage path hints `{userId}/{folder}/{file}` sent alongside the files
    pub stored_paths: Vec<String>,
}

/// Validate an upload and lay out its multipart fields
///
/// Order-bundle files are renamed `court-order-{stamp}.{ext}` and
/// `case-status-{stamp}.{ext}`; a bundle without a case number is filed
/// under `case-{stamp}`.
pub fn prepare(
    user_id: Uuid,
    request: UploadRequest,
    now: DateTime<Utc>,
) -> Result<PreparedUpload, RelayError> {
    let upload_type = request.upload_type();
    let mut text_fields = vec![
        ("userId", user_id.to_string()),
        ("uploadType", upload_type.to_string()),
    ];

    match request {
        UploadRequest::OrderBundle {
            case_number,
            court_order,
            case_status,
        } => {
            if court_order.is_none() && case_status.is_none() {
                return Err(RelayError::InvalidUpload(
                    "at least one file (court order or case status) is required".to_string(),
                ));
            }

            let stamp = file_stamp(now);
            let folder = case_number
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("case-{}", stamp));
            text_fields.push(("caseNumber", folder.clone()));

            let mut files = Vec::new();
            let mut stored_paths = Vec::new();
            let slots = [
                (court_order, "courtOrder", "courtOrderFilePath", "court-order"),
                (case_status, "caseStatus", "caseStatusFilePath", "case-status"),
            ];
            for (file, field, path_field, prefix) in slots {
                let Some(file) = file else { continue };
                file.check_size()?;
                let ext = file
                    .extension()
                    .filter(|ext| BUNDLE_EXTENSIONS.contains(&ext.as_str()))
                    .ok_or_else(|| RelayError::UnsupportedFile {
                        file_name: file.file_name.clone(),
                        reason: "expected .pdf, .jpg, .jpeg or .png".to_string(),
                    })?;

                let renamed = format!("{}-{}.{}", prefix, stamp, ext);
                let path = format!("{}/{}/{}", user_id, folder, renamed);
                text_fields.push((path_field, path.clone()));
                stored_paths.push(path);
                files.push(PreparedFile {
                    field,
                    file_name: renamed,
                    content_type: file.mime(),
                    bytes: file.bytes,
                });
            }

            Ok(PreparedUpload {
                upload_type,
                text_fields,
                files,
                case_number: Some(folder),
                stored_paths,
            })
        }
        UploadRequest::NewCase { file } => {
            file.check_size()?;
            file.require_pdf()?;
            Ok(PreparedUpload {
                upload_type,
                text_fields,
                files: vec![PreparedFile {
                    field: "file",
                    file_name: file.file_name.clone(),
                    content_type: PDF_MIME.to_string(),
                    bytes: file.bytes,
                }],
                case_number: None,
                stored_paths: Vec::new(),
            })
        }
        UploadRequest::FollowUp {
            case_id,
            case_number,
            document_type,
            file,
        } => {
            file.check_size()?;
            file.require_pdf()?;
            let case_number = case_number.trim().to_string();
            if case_number.is_empty() {
                return Err(RelayError::InvalidUpload("missing caseNumber".to_string()));
            }
            text_fields.push(("caseId", case_id.to_string()));
            text_fields.push(("caseNumber", case_number.clone()));
            text_fields.push(("documentType", document_type.to_string()));

            Ok(PreparedUpload {
                upload_type,
                text_fields,
                files: vec![PreparedFile {
                    field: "file",
                    file_name: file.file_name.clone(),
                    content_type: PDF_MIME.to_string(),
                    bytes: file.bytes,
                }],
                case_number: Some(case_number),
                stored_paths: Vec::new(),
            })
        }
    }
}

/// Acknowledgement returned to the uploader (HTTP 202)
#[derive(Debug, Clone, Serialize)]
pub struct RelayReceipt {
    pub upload_type: &'static str,
    pub case_number: Option<String>,
    pub stored_paths: Vec<String>,
    pub relay_status: u16,
}

/// HTTP client for the automation webhook
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    webhook_url: String,
}

impl RelayClient {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cmon-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Validate and forward one upload
    pub async fn send(
        &self,
        user_id: Uuid,
        request: UploadRequest,
        now: DateTime<Utc>,
    ) -> Result<RelayReceipt, RelayError> {
        let prepared = prepare(user_id, request, now)?;
        debug!(
            "Relaying {} upload ({} files) for user {}",
            prepared.upload_type,
            prepared.files.len(),
            user_id
        );

        let mut form = Form::new();
        for (name, value) in prepared.text_fields {
            form = form.text(name, value);
        }
        for file in prepared.files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)?;
            form = form.part(file.field, part);
        }

        let response = self
            .client
            .post(&self.webhook_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Relay rejected {} upload: {} {}", prepared.upload_type, status, body);
            return Err(RelayError::Server {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            "Relayed {} upload for user {} (case {:?})",
            prepared.upload_type, user_id, prepared.case_number
        );

        Ok(RelayReceipt {
            upload_type: prepared.upload_type,
            case_number: prepared.case_number,
            stored_paths: prepared.stored_paths,
            relay_status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 12, 9, 30, 15).unwrap() + chrono::Duration::milliseconds(123)
    }

    fn pdf(name: &str) -> UploadFile {
        UploadFile::new(name, Some(PDF_MIME.to_string()), b"%PDF-1.4".to_vec())
    }

    fn field<'a>(prepared: &'a PreparedUpload, name: &str) -> Option<&'a str> {
        prepared
            .text_fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_bundle_requires_a_file() {
        let request = UploadRequest::OrderBundle {
            case_number: Some("WP/1170/2025".to_string()),
            court_order: None,
            case_status: None,
        };
        let err = prepare(Uuid::nil(), request, now()).unwrap_err();
        assert!(matches!(err, RelayError::InvalidUpload(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_bundle_renames_files_and_builds_paths() {
        let user = Uuid::nil();
        let request = UploadRequest::OrderBundle {
            case_number: Some("WP-1170-2025".to_string()),
            court_order: Some(pdf("scan of order.PDF")),
            case_status: Some(UploadFile::new("status.png", Some("image/png".to_string()), vec![1, 2])),
        };

        let prepared = prepare(user, request, now()).unwrap();

        assert_eq!(prepared.upload_type, UPLOAD_ORDER_BUNDLE);
        assert_eq!(field(&prepared, "caseNumber"), Some("WP-1170-2025"));
        assert_eq!(prepared.files.len(), 2);
        assert_eq!(prepared.files[0].field, "courtOrder");
        assert_eq!(prepared.files[0].file_name, "court-order-2025-08-12T09-30-15-123Z.pdf");
        assert_eq!(prepared.files[1].file_name, "case-status-2025-08-12T09-30-15-123Z.png");
        assert_eq!(
            field(&prepared, "courtOrderFilePath"),
            Some("00000000-0000-0000-0000-000000000000/WP-1170-2025/court-order-2025-08-12T09-30-15-123Z.pdf")
        );
        assert_eq!(prepared.stored_paths.len(), 2);
    }

    #[test]
    fn test_bundle_without_case_number_uses_generated_folder() {
        let request = UploadRequest::OrderBundle {
            case_number: Some("  ".to_string()),
            court_order: None,
            case_status: Some(pdf("status.pdf")),
        };
        let prepared = prepare(Uuid::nil(), request, now()).unwrap();
        assert_eq!(
            prepared.case_number.as_deref(),
            Some("case-2025-08-12T09-30-15-123Z")
        );
        assert!(field(&prepared, "courtOrderFilePath").is_none());
    }

    #[test]
    fn test_bundle_rejects_unknown_extension() {
        let request = UploadRequest::OrderBundle {
            case_number: None,
            court_order: Some(UploadFile::new("order.docx", None, vec![0])),
            case_status: None,
        };
        assert!(matches!(
            prepare(Uuid::nil(), request, now()),
            Err(RelayError::UnsupportedFile { .. })
        ));
    }

    #[test]
    fn test_file_over_limit_rejected() {
        let big = UploadFile::new("big.pdf", Some(PDF_MIME.to_string()), vec![0; MAX_FILE_BYTES + 1]);
        let err = prepare(Uuid::nil(), UploadRequest::NewCase { file: big }, now()).unwrap_err();
        assert!(matches!(err, RelayError::FileTooLarge { size, .. } if size == MAX_FILE_BYTES + 1));
    }

    #[test]
    fn test_new_case_requires_pdf() {
        let image = UploadFile::new("case.jpg", Some("image/jpeg".to_string()), vec![0]);
        assert!(matches!(
            prepare(Uuid::nil(), UploadRequest::NewCase { file: image }, now()),
            Err(RelayError::UnsupportedFile { .. })
        ));

        let prepared = prepare(Uuid::nil(), UploadRequest::NewCase { file: pdf("case.pdf") }, now()).unwrap();
        assert_eq!(field(&prepared, "uploadType"), Some("case-status"));
        assert_eq!(prepared.files[0].field, "file");
    }

    #[test]
    fn test_follow_up_from_form() {
        let case_id = Uuid::new_v4();
        let text = HashMap::from([
            ("uploadType".to_string(), "follow-up".to_string()),
            ("caseId".to_string(), case_id.to_string()),
            ("caseNumber".to_string(), "PIL/2243/2025".to_string()),
            ("documentType".to_string(), "affidavit".to_string()),
        ]);
        let files = HashMap::from([("file".to_string(), pdf("affidavit.pdf"))]);

        let request = UploadRequest::from_form(text, files).unwrap();
        let prepared = prepare(Uuid::nil(), request, now()).unwrap();

        assert_eq!(field(&prepared, "caseId"), Some(case_id.to_string().as_str()));
        assert_eq!(field(&prepared, "documentType"), Some("affidavit"));
        assert_eq!(prepared.case_number.as_deref(), Some("PIL/2243/2025"));
    }

    #[test]
    fn test_from_form_rejects_unknown_document_type() {
        let text = HashMap::from([
            ("uploadType".to_string(), "follow-up".to_string()),
            ("caseId".to_string(), Uuid::new_v4().to_string()),
            ("documentType".to_string(), "memo".to_string()),
        ]);
        let files = HashMap::from([("file".to_string(), pdf("memo.pdf"))]);
        assert!(matches!(
            UploadRequest::from_form(text, files),
            Err(RelayError::InvalidUpload(_))
        ));
    }

    #[test]
    fn test_from_form_defaults_to_order_bundle() {
        let files = HashMap::from([("courtOrder".to_string(), pdf("order.pdf"))]);
        let request = UploadRequest::from_form(HashMap::new(), files).unwrap();
        assert_eq!(request.upload_type(), UPLOAD_ORDER_BUNDLE);
    }

    #[test]
    fn test_document_type_round_trip_names() {
        for name in ["order", "reply", "disposal", "notice", "affidavit", "other"] {
            assert_eq!(name.parse::<DocumentType>().unwrap().as_str(), name);
        }
    }
}
