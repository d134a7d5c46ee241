//! 终端前端
//!
//! 扮演"页面"的角色：收集表单输入、触发提交 / 重试 / 再来一次，并把界面状态打印出来

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::clients::ReqwestTransport;
use crate::config::Config;
use crate::error::FormField;
use crate::models::{Attachment, RawForm};
use crate::presentation::{render_text, Clipboard, CopyAffordance, CopyFeedback};
use crate::services::{InputNormalizer, SubmissionLog};
use crate::utils::logging::{log_shutdown, log_startup};
use crate::workflow::{SubmissionController, SubmitOutcome};

const HELP: &str = "\
命令:
  folder <链接或ID>   设置 Google Drive 文件夹
  message <文本>      设置消息
  attach <路径>       添加附件（可多次）
  detach              清空附件
  send                提交表单
  retry               重试上一次提交
  again               开始新一轮（清空表单并生成新的会话）
  copy <序号>         复制第 n 行结果
  show                显示当前表单和界面
  help                显示帮助
  quit                退出";

/// 表单草稿（尚未提交的输入）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub folder_id: String,
    pub message: String,
    pub files: Vec<PathBuf>,
}

impl FormDraft {
    /// 读取附件内容，得到可以交给控制器的原始表单
    pub async fn to_raw_form(&self) -> Result<RawForm> {
        let mut attachments = Vec::with_capacity(self.files.len());
        for path in &self.files {
            attachments.push(Attachment::from_path(path).await?);
        }
        Ok(RawForm {
            folder_id: self.folder_id.clone(),
            message: self.message.clone(),
            attachments,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 终端命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Folder(String),
    Message(String),
    Attach(PathBuf),
    Detach,
    Send,
    Retry,
    Again,
    Copy(usize),
    Show,
    Help,
    Quit,
    Unknown(String),
}

/// 解析一行输入，空行返回 None
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "folder" => Command::Folder(rest.to_string()),
        "message" => Command::Message(rest.to_string()),
        "attach" if !rest.is_empty() => Command::Attach(PathBuf::from(rest)),
        "detach" => Command::Detach,
        "send" | "submit" => Command::Send,
        "retry" => Command::Retry,
        "again" | "run-again" => Command::Again,
        "copy" => match rest.parse::<usize>() {
            Ok(index) if index > 0 => Command::Copy(index),
            _ => Command::Unknown(line.to_string()),
        },
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}

/// 应用主结构
pub struct App {
    controller: SubmissionController<ReqwestTransport>,
    draft: FormDraft,
    clipboard: Clipboard,
    copy_buttons: Vec<CopyAffordance>,
    copy_hold: Duration,
    requests_sent: usize,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let mut controller = SubmissionController::new(
            ReqwestTransport::new(),
            config.webhook_url.clone(),
            InputNormalizer::new(config.drive_host.clone()),
        );

        if let Some(path) = &config.submission_log_file {
            let log = SubmissionLog::with_path(path);
            match log.init().await {
                Ok(()) => controller = controller.with_submission_log(log),
                Err(e) => warn!(
                    "⚠️ 提交记录不可用 ({})，本次不记录: {:#}",
                    log.path().display(),
                    e
                ),
            }
        }

        log_startup(&config, controller.session_id().as_str());

        Ok(Self {
            controller,
            draft: FormDraft::default(),
            clipboard: Clipboard::system(),
            copy_buttons: Vec::new(),
            copy_hold: Duration::from_millis(config.copy_feedback_ms),
            requests_sent: 0,
        })
    }

    pub fn controller(&self) -> &SubmissionController<ReqwestTransport> {
        &self.controller
    }

    /// 单次提交模式：提交一次并打印结果，返回是否成功
    pub async fn run_once(
        &mut self,
        folder_id: String,
        message: String,
        files: Vec<PathBuf>,
    ) -> Result<bool> {
        self.draft = FormDraft {
            folder_id,
            message,
            files,
        };
        let outcome = self.send().await?;
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(render_text(&self.controller.view()).as_bytes())
            .await?;
        stdout.flush().await?;
        log_shutdown(self.requests_sent);
        Ok(matches!(outcome, SubmitOutcome::Rendered(_)))
    }

    /// 交互模式主循环
    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        stdout.write_all(format!("{}\n\n", HELP).as_bytes()).await?;
        stdout
            .write_all(render_text(&self.controller.view()).as_bytes())
            .await?;

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await.context("读取输入失败")? else {
                break;
            };
            let Some(command) = parse_command(&line) else {
                continue;
            };
            if command == Command::Quit {
                break;
            }

            let output = self.handle(command).await;
            stdout.write_all(output.as_bytes()).await?;
        }

        log_shutdown(self.requests_sent);
        Ok(())
    }

    /// 处理一条命令，返回要打印的文本
    async fn handle(&mut self, command: Command) -> String {
        match command {
            Command::Folder(value) => {
                self.draft.folder_id = value;
                String::new()
            }
            Command::Message(value) => {
                self.draft.message = value;
                String::new()
            }
            Command::Attach(path) => {
                self.draft.files.push(path);
                format!("  已添加附件，共 {} 个\n", self.draft.files.len())
            }
            Command::Detach => {
                self.draft.files.clear();
                "  已清空附件\n".to_string()
            }
            Command::Send => match self.send().await {
                Ok(_) => render_text(&self.controller.view()),
                Err(e) => format!("  ✗ {:#}\n", e),
            },
            Command::Retry => {
                if self.controller.retry().await != SubmitOutcome::Ignored {
                    self.after_request();
                }
                render_text(&self.controller.view())
            }
            Command::Again => {
                self.draft.reset();
                self.copy_buttons.clear();
                self.controller.run_again();
                render_text(&self.controller.view())
            }
            Command::Copy(index) => self.copy_row(index),
            Command::Show => self.describe(),
            Command::Help => format!("{}\n", HELP),
            Command::Quit => String::new(),
            Command::Unknown(line) => format!("  未知命令: {} (输入 help 查看帮助)\n", line),
        }
    }

    async fn send(&mut self) -> Result<SubmitOutcome> {
        let form = self.draft.to_raw_form().await.map_err(|e| {
            warn!("⚠️ {:#}", e);
            e
        })?;
        let outcome = self.controller.submit(form).await;
        if let SubmitOutcome::Invalid(violations) = &outcome {
            if let Some(first) = violations.first() {
                info!("请先填写字段: {}", first.field);
            }
        } else if outcome != SubmitOutcome::Ignored {
            self.after_request();
        }
        Ok(outcome)
    }

    fn after_request(&mut self) {
        self.requests_sent += 1;
        let rows = self
            .controller
            .view()
            .results
            .map(|r| r.rows.len())
            .unwrap_or(0);
        self.copy_buttons = vec![CopyAffordance::new(self.copy_hold); rows];
    }

    fn copy_row(&mut self, index: usize) -> String {
        let view = self.controller.view();
        let Some(row) = view
            .results
            .as_ref()
            .and_then(|results| results.rows.get(index - 1))
        else {
            return format!("  没有第 {} 行结果\n", index);
        };
        let Some(button) = self.copy_buttons.get_mut(index - 1) else {
            return format!("  没有第 {} 行结果\n", index);
        };

        match button.press(&self.clipboard, &row.value) {
            Some(CopyFeedback::Copied) | Some(CopyFeedback::Failed) => {
                format!("  [{}] {}\n", row.key, button.label())
            }
            None => format!("  [{}] {} (请稍候)\n", row.key, button.label()),
        }
    }

    fn describe(&self) -> String {
        let view = self.controller.view();
        let marker = |field: FormField| {
            if view.focus == Some(field) {
                "▶"
            } else {
                " "
            }
        };
        let mut out = format!(
            "{} Google Drive Folder: {}\n{} Message: {}\n  Files: {}\n  Session: {}\n  Endpoint: {}\n",
            marker(FormField::FolderId),
            self.draft.folder_id,
            marker(FormField::Message),
            self.draft.message,
            self.draft
                .files
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            self.controller.session_id(),
            self.controller.endpoint()
        );
        out.push_str(&render_text(&view));
        out
    }
}
