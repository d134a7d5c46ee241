//! 提交记录服务 - 业务能力层
//!
//! 只负责"追加一行提交记录"能力，不关心流程

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::SubmissionSnapshot;

/// 一次请求的最终结果，用于写入记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggedOutcome<'a> {
    Rendered { keys: usize },
    Failed { status: Option<u16>, message: &'a str },
}

/// 提交记录服务
///
/// 职责：
/// - 每次请求结束后追加一行：时间、会话、文件夹、附件数、结果
/// - 只追加，从不读回
pub struct SubmissionLog {
    log_file_path: PathBuf,
}

impl SubmissionLog {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.log_file_path
    }

    /// 初始化记录文件（写入文件头）
    pub async fn init(&self) -> Result<()> {
        let header = format!(
            "{}\n提交记录 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        tokio::fs::write(&self.log_file_path, header)
            .await
            .with_context(|| format!("无法初始化提交记录: {}", self.log_file_path.display()))
    }

    /// 追加一条记录
    pub async fn record(
        &self,
        snapshot: &SubmissionSnapshot,
        outcome: LoggedOutcome<'_>,
    ) -> Result<()> {
        let result = match outcome {
            LoggedOutcome::Rendered { keys } => format!("成功 ({} 个字段)", keys),
            LoggedOutcome::Failed {
                status: Some(code),
                message,
            } => format!("失败 HTTP {}: {}", code, message),
            LoggedOutcome::Failed {
                status: None,
                message,
            } => format!("失败: {}", message),
        };
        let line = format!(
            "{} | 会话 {} | 文件夹 {} | 附件 {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            snapshot.session_id(),
            snapshot.folder_id(),
            snapshot.attachments().len(),
            result
        );

        debug!("写入提交记录: {}", line.trim_end());

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .with_context(|| format!("无法打开提交记录: {}", self.log_file_path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionId, ValidatedForm};

    #[tokio::test]
    async fn test_init_then_record_appends_lines() {
        let path = std::env::temp_dir().join(format!("dfb-log-{}.log", SessionId::generate()));
        let log = SubmissionLog::with_path(&path);
        log.init().await.unwrap();

        let session = SessionId::generate();
        let snapshot = SubmissionSnapshot::new(
            ValidatedForm {
                folder_id: "F1".to_string(),
                message: "hi".to_string(),
                attachments: Vec::new(),
            },
            session.clone(),
        );
        log.record(&snapshot, LoggedOutcome::Rendered { keys: 2 })
            .await
            .unwrap();
        log.record(
            &snapshot,
            LoggedOutcome::Failed {
                status: Some(500),
                message: "boom",
            },
        )
        .await
        .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        let lines: Vec<&str> = content.lines().filter(|l| l.contains("会话")).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(session.as_str()));
        assert!(lines[0].contains("成功 (2 个字段)"));
        assert!(lines[1].contains("失败 HTTP 500: boom"));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
