use std::fmt;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 附件读取失败
    #[error("无法读取附件 {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// Webhook 地址不可用
    #[error("Webhook 地址无效 ({url}): {reason}")]
    InvalidWebhookUrl { url: String, reason: String },
}

/// 表单字段（按文档顺序排列）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    FolderId,
    Message,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormField::FolderId => write!(f, "driveFolderId"),
            FormField::Message => write!(f, "message"),
        }
    }
}

/// 字段校验失败的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
}

/// 字段级校验错误
///
/// 只在表单旁内联显示，永远不会进入错误面板，也不会发出请求。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: FormField,
    pub kind: ViolationKind,
    pub message: String,
}

impl ValidationError {
    pub fn required(field: FormField) -> Self {
        let message = match field {
            FormField::FolderId => "Google Drive Folder is required.",
            FormField::Message => "Message is required.",
        };
        Self {
            field,
            kind: ViolationKind::Required,
            message: message.to_string(),
        }
    }
}

/// 传输层错误：没有拿到任何响应
#[derive(Debug, Clone, Error)]
#[error("传输失败: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

pub const NETWORK_FAILURE_MESSAGE: &str =
    "Network request failed. Check your connection and try again.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// 请求发出之后可能出现的全部错误
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Network request failed. Check your connection and try again.")]
    Transport(#[source] TransportError),

    #[error("Unable to read response body.")]
    ResponseRead { status: u16, status_text: String },

    #[error("Response body was empty and not valid JSON.")]
    EmptyBody { status: u16, status_text: String },

    #[error("Response was not valid JSON.")]
    MalformedJson {
        status: u16,
        status_text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{message}")]
    Server {
        message: String,
        status: u16,
        status_text: String,
    },

    #[error("Response JSON must be a flat key/value object.")]
    Shape { status: u16, status_text: String },
}

impl SubmitError {
    /// HTTP 状态码；传输失败时没有
    pub fn status(&self) -> Option<u16> {
        match self {
            SubmitError::Transport(_) => None,
            SubmitError::ResponseRead { status, .. }
            | SubmitError::EmptyBody { status, .. }
            | SubmitError::MalformedJson { status, .. }
            | SubmitError::Server { status, .. }
            | SubmitError::Shape { status, .. } => Some(*status),
        }
    }

    pub fn status_text(&self) -> &str {
        match self {
            SubmitError::Transport(_) => "",
            SubmitError::ResponseRead { status_text, .. }
            | SubmitError::EmptyBody { status_text, .. }
            | SubmitError::MalformedJson { status_text, .. }
            | SubmitError::Server { status_text, .. }
            | SubmitError::Shape { status_text, .. } => status_text,
        }
    }

    /// 归一化为统一的展示形状
    pub fn to_display(&self) -> DisplayError {
        DisplayError::new(self.to_string(), self.status(), self.status_text())
    }
}

impl From<TransportError> for SubmitError {
    fn from(err: TransportError) -> Self {
        SubmitError::Transport(err)
    }
}

/// 所有失败路径在渲染前汇聚成的统一形状
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayError {
    pub message: String,
    pub status: Option<u16>,
    pub status_text: String,
}

impl DisplayError {
    pub fn new(message: impl Into<String>, status: Option<u16>, status_text: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNEXPECTED_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            message,
            status,
            status_text: status_text.into(),
        }
    }

    /// 错误面板上的状态行
    pub fn status_line(&self) -> String {
        match self.status {
            Some(code) if self.status_text.is_empty() => format!("HTTP {}", code),
            Some(code) => format!("HTTP {} {}", code, self.status_text),
            None => "Request error".to_string(),
        }
    }
}

impl From<&SubmitError> for DisplayError {
    fn from(err: &SubmitError) -> Self {
        err.to_display()
    }
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status_line(), self.message)
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
