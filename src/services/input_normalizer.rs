//! 输入规范化服务 - 业务能力层
//!
//! 只负责"校验并规范化表单"能力，不发请求、不关心界面

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::{FormField, ValidationError};
use crate::models::{RawForm, ValidatedForm};

fn folders_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/folders/([A-Za-z0-9_-]+)").expect("valid folders regex"))
}

fn id_param() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").expect("valid id regex"))
}

fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// 输入规范化服务
///
/// 职责：
/// - 从粘贴的 Drive 链接中尽力提取文件夹 ID
/// - 校验必填字段，一次性报告所有错误
/// - 不修改附件，也不限制数量和大小
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    drive_host: String,
}

impl InputNormalizer {
    pub fn new(drive_host: impl Into<String>) -> Self {
        Self {
            drive_host: drive_host.into(),
        }
    }

    /// 校验表单
    ///
    /// 失败时按文档顺序返回所有字段错误，不会在第一个错误处停下。
    pub fn normalize(&self, raw: RawForm) -> Result<ValidatedForm, Vec<ValidationError>> {
        let mut violations = Vec::new();

        let folder_id = self.normalize_folder_id(&raw.folder_id);
        if folder_id.is_empty() {
            violations.push(ValidationError::required(FormField::FolderId));
        }

        let message = raw.message.trim().to_string();
        if message.is_empty() {
            violations.push(ValidationError::required(FormField::Message));
        }

        if !violations.is_empty() {
            debug!("表单校验失败: {} 个字段", violations.len());
            return Err(violations);
        }

        Ok(ValidatedForm {
            folder_id,
            message,
            attachments: raw.attachments,
        })
    }

    /// 规范化文件夹 ID：提取失败时退回到去空白后的原始输入
    ///
    /// 只有输入为空白时才返回空字符串。
    pub fn normalize_folder_id(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        self.extract_folder_id(trimmed)
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// 从输入中提取文件夹 ID
    ///
    /// 依次尝试 `/folders/<id>`、`id=<id>` 查询参数，最后把输入当作 Drive 链接解析。
    pub fn extract_folder_id(&self, input: &str) -> Option<String> {
        if let Some(caps) = folders_segment().captures(input) {
            return Some(caps[1].to_string());
        }

        if let Some(caps) = id_param().captures(input) {
            return Some(caps[1].to_string());
        }

        let parsed = Url::parse(input).ok()?;
        let host = parsed.host_str()?;
        if !host.eq_ignore_ascii_case(&self.drive_host) {
            return None;
        }

        if let Some(caps) = folders_segment().captures(parsed.path()) {
            return Some(caps[1].to_string());
        }

        parsed
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned())
            .filter(|value| is_token(value))
    }
}

impl Default for InputNormalizer {
    fn default() -> Self {
        Self::new("drive.google.com")
    }
}
