use std::path::Path;

use tokio::fs;

use super::session::SessionId;
use crate::error::{AppError, AppResult};

/// 附件：原始文件内容和文件名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// 从磁盘读取附件，文件名取路径的最后一段
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let content = fs::read(path)
            .await
            .map_err(|source| AppError::Attachment {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, content })
    }
}

/// 表单原始输入
#[derive(Debug, Clone, Default)]
pub struct RawForm {
    pub folder_id: String,
    pub message: String,
    pub attachments: Vec<Attachment>,
}

/// 通过校验的表单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    pub folder_id: String,
    pub message: String,
    pub attachments: Vec<Attachment>,
}

/// 提交快照
///
/// 提交时捕获，重试时原样复用；创建后不可修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSnapshot {
    folder_id: String,
    message: String,
    session_id: SessionId,
    attachments: Vec<Attachment>,
}

impl SubmissionSnapshot {
    pub fn new(form: ValidatedForm, session_id: SessionId) -> Self {
        Self {
            folder_id: form.folder_id,
            message: form.message,
            session_id,
            attachments: form.attachments,
        }
    }

    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
