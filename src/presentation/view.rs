//! 界面状态
//!
//! 控制器只修改这里的状态，前端根据它绘制界面

use crate::error::{DisplayError, FormField, ValidationError};
use crate::models::ResultPayload;

pub const STATUS_READY: &str = "Ready.";
pub const STATUS_SENDING: &str = "Sending request...";
pub const STATUS_COMPLETED: &str = "Request completed.";
pub const STATUS_FAILED: &str = "Request failed.";

pub const SUBMIT_LABEL: &str = "Send Request";
pub const SUBMIT_LABEL_BUSY: &str = "Sending...";
pub const EMPTY_STATE: &str = "No fields returned.";

/// 结果列表中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub key: String,
    pub value: String,
}

/// 结果区
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultsView {
    pub rows: Vec<ResultRow>,
}

impl ResultsView {
    pub fn from_payload(payload: &ResultPayload) -> Self {
        let rows = payload
            .iter()
            .map(|(key, value)| ResultRow {
                key: key.to_string(),
                value: value.render(),
            })
            .collect();
        Self { rows }
    }

    /// 没有任何键时显示空状态提示而不是空列表
    pub fn is_empty_state(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 错误面板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub status_line: String,
    pub message: String,
}

impl From<&DisplayError> for ErrorPanel {
    fn from(err: &DisplayError) -> Self {
        Self {
            status_line: err.status_line(),
            message: err.message.clone(),
        }
    }
}

/// 整个界面的可渲染状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub field_errors: Vec<ValidationError>,
    pub focus: Option<FormField>,
    pub status_line: String,
    pub results: Option<ResultsView>,
    pub error_panel: Option<ErrorPanel>,
    pub busy: bool,
    pub retry_enabled: bool,
    pub run_again_visible: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            field_errors: Vec::new(),
            focus: None,
            status_line: STATUS_READY.to_string(),
            results: None,
            error_panel: None,
            busy: false,
            retry_enabled: false,
            run_again_visible: false,
        }
    }
}

impl ViewState {
    pub fn submit_enabled(&self) -> bool {
        !self.busy
    }

    pub fn submit_label(&self) -> &'static str {
        if self.busy {
            SUBMIT_LABEL_BUSY
        } else {
            SUBMIT_LABEL
        }
    }

    pub fn field_error(&self, field: FormField) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|v| v.field == field)
            .map(|v| v.message.as_str())
    }

    /// 显示字段错误并把焦点放到第一个出错的字段
    pub fn set_field_errors(&mut self, violations: &[ValidationError]) {
        self.field_errors = violations.to_vec();
        self.focus = violations.iter().map(|v| v.field).min();
    }

    pub fn clear_field_errors(&mut self) {
        self.field_errors.clear();
        self.focus = None;
    }

    pub fn set_status(&mut self, status: &str) {
        self.status_line = status.to_string();
    }

    pub fn clear_results(&mut self) {
        self.results = None;
    }

    pub fn show_results(&mut self, payload: &ResultPayload) {
        self.hide_error();
        self.results = Some(ResultsView::from_payload(payload));
    }

    /// 显示错误面板，同时清空已有结果
    pub fn show_error(&mut self, err: &DisplayError) {
        self.clear_results();
        self.error_panel = Some(ErrorPanel::from(err));
    }

    pub fn hide_error(&mut self) {
        self.error_panel = None;
    }
}

/// 终端文本渲染
pub fn render_text(view: &ViewState) -> String {
    let rule = "─".repeat(60);
    let mut out = String::new();

    for violation in &view.field_errors {
        out.push_str(&format!("  ✗ [{}] {}\n", violation.field, violation.message));
    }

    if let Some(results) = &view.results {
        out.push_str(&format!("{}\n", rule));
        if results.is_empty_state() {
            out.push_str(&format!("  {}\n", EMPTY_STATE));
        }
        for (index, row) in results.rows.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", index + 1, row.key));
            for line in row.value.lines() {
                out.push_str(&format!("       {}\n", line));
            }
            if row.value.is_empty() {
                out.push('\n');
            }
        }
        out.push_str(&format!("{}\n", rule));
    }

    if let Some(panel) = &view.error_panel {
        out.push_str(&format!(
            "{rule}\n  ❌ {}\n  {}\n{rule}\n",
            panel.status_line, panel.message
        ));
    }

    let mut actions = vec![format!(
        "[{}{}]",
        view.submit_label(),
        if view.submit_enabled() { "" } else { " (disabled)" }
    )];
    if view.retry_enabled {
        actions.push("[Retry]".to_string());
    }
    if view.run_again_visible {
        actions.push("[Run again]".to_string());
    }
    out.push_str(&format!("{}  {}\n", view.status_line, actions.join(" ")));

    out
}
