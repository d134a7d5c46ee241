//! 复制按钮
//!
//! 先写系统剪贴板，失败时退回到平台命令（pbcopy / xclip / xsel / clip）。
//! 按下后显示 "Copied" 或 "Copy failed"，保持一小段时间后恢复为 "Copy"，
//! 期间按钮处于禁用状态。

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::time::Instant;
use tracing::debug;

pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied";
pub const COPY_FAILED_LABEL: &str = "Copy failed";

/// 默认反馈持续时间
pub const DEFAULT_FEEDBACK_HOLD: Duration = Duration::from_millis(1200);

/// 剪贴板写入能力
pub trait ClipboardBackend: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// 系统剪贴板（arboard）
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardBackend for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("系统剪贴板不可用")?;
        clipboard
            .set_text(text.to_string())
            .context("写入系统剪贴板失败")
    }
}

#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "linux")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[];

/// 通过平台命令写入剪贴板
#[derive(Debug, Default)]
pub struct CommandClipboard;

impl CommandClipboard {
    fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("无法启动 {}", program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .with_context(|| format!("写入 {} 失败", program))?;
        }

        let status = child
            .wait()
            .with_context(|| format!("等待 {} 失败", program))?;
        if status.success() {
            Ok(())
        } else {
            Err(anyhow!("{} 退出码: {}", program, status))
        }
    }
}

impl ClipboardBackend for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut last_error = anyhow!("当前平台不支持命令行剪贴板");
        for (program, args) in CLIPBOARD_COMMANDS {
            match Self::pipe_to(program, args, text) {
                Ok(()) => return Ok(()),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}

/// 带兜底的剪贴板
pub struct Clipboard {
    primary: Box<dyn ClipboardBackend>,
    fallback: Box<dyn ClipboardBackend>,
}

impl Clipboard {
    pub fn new(primary: Box<dyn ClipboardBackend>, fallback: Box<dyn ClipboardBackend>) -> Self {
        Self { primary, fallback }
    }

    /// 系统剪贴板 + 平台命令兜底
    pub fn system() -> Self {
        Self::new(Box::new(SystemClipboard), Box::new(CommandClipboard))
    }

    /// 返回是否复制成功
    pub fn copy(&self, text: &str) -> bool {
        match self.primary.write_text(text) {
            Ok(()) => true,
            Err(e) => {
                debug!("系统剪贴板写入失败，尝试兜底方式: {:#}", e);
                match self.fallback.write_text(text) {
                    Ok(()) => true,
                    Err(e) => {
                        debug!("兜底剪贴板写入失败: {:#}", e);
                        false
                    }
                }
            }
        }
    }
}

/// 复制结果反馈
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyFeedback {
    Copied,
    Failed,
}

impl CopyFeedback {
    pub fn label(self) -> &'static str {
        match self {
            CopyFeedback::Copied => COPIED_LABEL,
            CopyFeedback::Failed => COPY_FAILED_LABEL,
        }
    }
}

/// 结果行上的复制按钮
#[derive(Debug, Clone)]
pub struct CopyAffordance {
    hold: Duration,
    feedback: Option<(CopyFeedback, Instant)>,
}

impl CopyAffordance {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            feedback: None,
        }
    }

    /// 按下按钮；反馈期间再次按下不会复制，返回 None
    pub fn press(&mut self, clipboard: &Clipboard, value: &str) -> Option<CopyFeedback> {
        self.press_at(clipboard, value, Instant::now())
    }

    pub fn press_at(
        &mut self,
        clipboard: &Clipboard,
        value: &str,
        now: Instant,
    ) -> Option<CopyFeedback> {
        if self.is_disabled_at(now) {
            return None;
        }

        let feedback = if clipboard.copy(value) {
            CopyFeedback::Copied
        } else {
            CopyFeedback::Failed
        };
        self.feedback = Some((feedback, now + self.hold));
        Some(feedback)
    }

    pub fn is_disabled_at(&self, now: Instant) -> bool {
        matches!(self.feedback, Some((_, until)) if now < until)
    }

    pub fn label_at(&self, now: Instant) -> &'static str {
        match self.feedback {
            Some((feedback, until)) if now < until => feedback.label(),
            _ => COPY_LABEL,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label_at(Instant::now())
    }
}

impl Default for CopyAffordance {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK_HOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording {
        fail: bool,
        writes: Arc<Mutex<Vec<String>>>,
    }

    impl ClipboardBackend for Recording {
        fn write_text(&self, text: &str) -> Result<()> {
            if self.fail {
                return Err(anyhow!("unavailable"));
            }
            self.writes.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn clipboard(primary_fails: bool, fallback_fails: bool) -> (Clipboard, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
        let primary_writes = Arc::new(Mutex::new(Vec::new()));
        let fallback_writes = Arc::new(Mutex::new(Vec::new()));
        let clipboard = Clipboard::new(
            Box::new(Recording {
                fail: primary_fails,
                writes: primary_writes.clone(),
            }),
            Box::new(Recording {
                fail: fallback_fails,
                writes: fallback_writes.clone(),
            }),
        );
        (clipboard, primary_writes, fallback_writes)
    }

    #[test]
    fn test_primary_clipboard_used_first() {
        let (clipboard, primary, fallback) = clipboard(false, false);
        assert!(clipboard.copy("v"));
        assert_eq!(*primary.lock().unwrap(), vec!["v".to_string()]);
        assert!(fallback.lock().unwrap().is_empty());
    }

    #[test]
    fn test_falls_back_when_primary_fails() {
        let (clipboard, _, fallback) = clipboard(true, false);
        assert!(clipboard.copy("v"));
        assert_eq!(*fallback.lock().unwrap(), vec!["v".to_string()]);
    }

    #[test]
    fn test_both_failing_reports_failure() {
        let (clipboard, _, _) = clipboard(true, true);
        assert!(!clipboard.copy("v"));
    }

    #[test]
    fn test_feedback_reverts_after_hold() {
        let (clipboard, primary, _) = clipboard(false, false);
        let mut button = CopyAffordance::default();
        let t0 = Instant::now();

        assert_eq!(button.label_at(t0), COPY_LABEL);
        assert_eq!(button.press_at(&clipboard, "v", t0), Some(CopyFeedback::Copied));
        assert_eq!(button.label_at(t0), COPIED_LABEL);
        assert!(button.is_disabled_at(t0 + Duration::from_millis(1199)));

        // 反馈期间再次按下不会重复复制
        assert_eq!(button.press_at(&clipboard, "v", t0 + Duration::from_millis(500)), None);
        assert_eq!(primary.lock().unwrap().len(), 1);

        let later = t0 + Duration::from_millis(1200);
        assert!(!button.is_disabled_at(later));
        assert_eq!(button.label_at(later), COPY_LABEL);
        assert_eq!(button.press_at(&clipboard, "v", later), Some(CopyFeedback::Copied));
        assert_eq!(primary.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_failure_feedback_label() {
        let (clipboard, _, _) = clipboard(true, true);
        let mut button = CopyAffordance::new(Duration::from_millis(50));
        let t0 = Instant::now();
        assert_eq!(button.press_at(&clipboard, "v", t0), Some(CopyFeedback::Failed));
        assert_eq!(button.label_at(t0), COPY_FAILED_LABEL);
        assert!(button.is_disabled_at(t0));
    }
}
