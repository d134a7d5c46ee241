/// Webhook 客户端
///
/// 封装请求构建和实际的 HTTP 发送
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::models::{Attachment, SubmissionSnapshot};

/// 附件在表单中的字段名（每个附件重复一次）
pub const FILES_FIELD: &str = "files";

/// JSON 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSubmission {
    pub drive_folder_id: String,
    pub message: String,
    pub session_id: String,
}

/// 请求体：无附件时为 JSON，有附件时为 multipart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Json(JsonSubmission),
    Multipart {
        fields: Vec<(&'static str, String)>,
        files: Vec<Attachment>,
    },
}

/// 发往 Webhook 的一次 POST 请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub endpoint: String,
    pub body: RequestBody,
}

impl OutboundRequest {
    pub fn is_multipart(&self) -> bool {
        matches!(self.body, RequestBody::Multipart { .. })
    }
}

/// 根据快照构建请求
pub fn build_request(endpoint: &str, snapshot: &SubmissionSnapshot) -> OutboundRequest {
    let body = if snapshot.has_attachments() {
        RequestBody::Multipart {
            fields: vec![
                ("driveFolderId", snapshot.folder_id().to_string()),
                ("message", snapshot.message().to_string()),
                ("sessionId", snapshot.session_id().to_string()),
            ],
            files: snapshot.attachments().to_vec(),
        }
    } else {
        RequestBody::Json(JsonSubmission {
            drive_folder_id: snapshot.folder_id().to_string(),
            message: snapshot.message().to_string(),
            session_id: snapshot.session_id().to_string(),
        })
    };

    OutboundRequest {
        endpoint: endpoint.to_string(),
        body,
    }
}

/// 拿到的 HTTP 响应
///
/// `body` 为 `Err` 表示状态行已收到但读取响应体失败。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Result<String, String>,
}

/// 发送请求的能力
///
/// 返回 `Err` 表示根本没有拿到响应（网络层失败）。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// 基于 reqwest 的传输实现
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// 创建新的传输客户端
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

fn multipart_form(fields: Vec<(&'static str, String)>, files: Vec<Attachment>) -> Form {
    let form = fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value));

    files.into_iter().fold(form, |form, attachment| {
        let part = Part::bytes(attachment.content).file_name(attachment.file_name);
        form.part(FILES_FIELD, part)
    })
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let OutboundRequest { endpoint, body } = request;

        let builder = match body {
            RequestBody::Json(payload) => {
                debug!("发送 JSON 请求: {}", endpoint);
                self.client.post(&endpoint).json(&payload)
            }
            RequestBody::Multipart { fields, files } => {
                debug!("发送 multipart 请求: {} ({} 个附件)", endpoint, files.len());
                self.client
                    .post(&endpoint)
                    .multipart(multipart_form(fields, files))
            }
        };

        let response = builder.send().await.map_err(|e| {
            warn!("请求未得到响应: {}", e);
            TransportError::from(e)
        })?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await.map_err(|e| e.to_string());

        debug!("收到响应: HTTP {}", status.as_u16());

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}
