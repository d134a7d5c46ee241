//! 提交控制器 - 流程层
//!
//! 核心职责：定义"一次提交"的完整流程，并驱动界面状态
//!
//! 流程顺序：
//! 1. 置忙 → 显示 "Run again" → 清空旧结果和错误
//! 2. 构建请求并发送
//! 3. 分类响应 → 渲染结果或错误面板
//! 4. 无论成功失败都清除忙碌标记
//!
//! 状态都保存在控制器自身（`Cell` / `RefCell`），方法只需要 `&self`，
//! 所以同一个控制器上可以同时存在多个调用；忙碌时新的提交和重试直接忽略。
//! 任何 `RefCell` 借用都不会跨越 `.await`。

use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clients::webhook_client::{build_request, Transport};
use crate::error::{DisplayError, SubmitError, ValidationError};
use crate::models::{RawForm, ResultPayload, SessionId, SubmissionSnapshot};
use crate::presentation::view::{
    ViewState, STATUS_COMPLETED, STATUS_FAILED, STATUS_READY, STATUS_SENDING,
};
use crate::services::input_normalizer::InputNormalizer;
use crate::services::submission_log::{LoggedOutcome, SubmissionLog};
use crate::utils::logging::truncate_text;

/// 提交生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Lifecycle::Idle => "idle",
            Lifecycle::Submitting => "submitting",
            Lifecycle::Succeeded => "succeeded",
            Lifecycle::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 一次提交或重试的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// 成功，结果已渲染
    Rendered(ResultPayload),
    /// 请求失败，错误面板已显示
    Failed(DisplayError),
    /// 表单校验失败，没有发出请求
    Invalid(Vec<ValidationError>),
    /// 正在提交中，或没有可重试的快照
    Ignored,
}

/// 提交控制器
///
/// - 持有当前会话 ID、最近一次快照、忙碌标记
/// - 每个页面（会话）只构造一次，通过 `run_again()` 显式开始新一轮
pub struct SubmissionController<T: Transport> {
    transport: T,
    endpoint: String,
    normalizer: InputNormalizer,
    submission_log: Option<SubmissionLog>,
    session_id: RefCell<SessionId>,
    last_snapshot: RefCell<Option<Arc<SubmissionSnapshot>>>,
    busy: Cell<bool>,
    lifecycle: Cell<Lifecycle>,
    view: RefCell<ViewState>,
}

/// 离开作用域时清除忙碌标记，保证任何结局下都会执行
struct BusyGuard<'a, T: Transport> {
    controller: &'a SubmissionController<T>,
}

impl<'a, T: Transport> BusyGuard<'a, T> {
    fn acquire(controller: &'a SubmissionController<T>) -> Self {
        controller.set_busy(true);
        Self { controller }
    }
}

impl<T: Transport> Drop for BusyGuard<'_, T> {
    fn drop(&mut self) {
        self.controller.set_busy(false);
    }
}

impl<T: Transport> SubmissionController<T> {
    /// 创建新的控制器，同时生成第一轮的会话 ID
    pub fn new(transport: T, endpoint: impl Into<String>, normalizer: InputNormalizer) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            normalizer,
            submission_log: None,
            session_id: RefCell::new(SessionId::generate()),
            last_snapshot: RefCell::new(None),
            busy: Cell::new(false),
            lifecycle: Cell::new(Lifecycle::Idle),
            view: RefCell::new(ViewState::default()),
        }
    }

    /// 每次请求结束后写入提交记录
    pub fn with_submission_log(mut self, log: SubmissionLog) -> Self {
        self.submission_log = Some(log);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn submission_log(&self) -> Option<&SubmissionLog> {
        self.submission_log.as_ref()
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id.borrow().clone()
    }

    pub fn last_snapshot(&self) -> Option<Arc<SubmissionSnapshot>> {
        self.last_snapshot.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    pub fn can_retry(&self) -> bool {
        !self.busy.get() && self.last_snapshot.borrow().is_some()
    }

    /// 当前界面状态的副本
    pub fn view(&self) -> ViewState {
        self.view.borrow().clone()
    }

    /// 提交表单
    ///
    /// 忙碌时直接忽略；校验失败时只显示字段错误，不发请求。
    pub async fn submit(&self, form: RawForm) -> SubmitOutcome {
        if self.busy.get() {
            debug!("提交进行中，忽略新的提交");
            return SubmitOutcome::Ignored;
        }

        {
            let mut view = self.view.borrow_mut();
            view.clear_field_errors();
            view.hide_error();
        }

        let validated = match self.normalizer.normalize(form) {
            Ok(validated) => validated,
            Err(violations) => {
                warn!("⚠️ 表单校验失败: {} 个字段", violations.len());
                self.view.borrow_mut().set_field_errors(&violations);
                return SubmitOutcome::Invalid(violations);
            }
        };

        let snapshot = Arc::new(SubmissionSnapshot::new(validated, self.session_id()));
        *self.last_snapshot.borrow_mut() = Some(snapshot.clone());

        self.send(snapshot).await
    }

    /// 用上一次的快照原样重试（同一会话 ID、同一批附件）
    pub async fn retry(&self) -> SubmitOutcome {
        if self.busy.get() {
            debug!("提交进行中，忽略重试");
            return SubmitOutcome::Ignored;
        }
        let Some(snapshot) = self.last_snapshot() else {
            debug!("没有可重试的快照");
            return SubmitOutcome::Ignored;
        };

        info!("🔁 重试上一次提交 (会话 {})", snapshot.session_id());
        self.send(snapshot).await
    }

    /// 开始新一轮：清空界面和快照，生成新的会话 ID
    pub fn run_again(&self) {
        *self.last_snapshot.borrow_mut() = None;
        let session_id = SessionId::generate();
        info!("🆕 开始新一轮，会话 ID: {}", session_id);
        *self.session_id.borrow_mut() = session_id;

        let mut view = self.view.borrow_mut();
        view.clear_field_errors();
        view.clear_results();
        view.hide_error();
        view.run_again_visible = false;
        view.retry_enabled = false;
        view.set_status(STATUS_READY);
        drop(view);

        self.lifecycle.set(Lifecycle::Idle);
    }

    async fn send(&self, snapshot: Arc<SubmissionSnapshot>) -> SubmitOutcome {
        let _busy = BusyGuard::acquire(self);
        self.lifecycle.set(Lifecycle::Submitting);
        {
            let mut view = self.view.borrow_mut();
            view.run_again_visible = true;
            view.clear_results();
            view.hide_error();
            view.set_status(STATUS_SENDING);
        }

        let request = build_request(&self.endpoint, &snapshot);
        info!(
            "📤 提交到 Webhook: 文件夹 {} | 附件 {} | 消息: {}",
            snapshot.folder_id(),
            snapshot.attachments().len(),
            truncate_text(snapshot.message(), 40)
        );

        let classified = match self.transport.send(request).await {
            Ok(response) => crate::services::classify_response(response),
            Err(e) => Err(SubmitError::from(e)),
        };

        let outcome = match classified {
            Ok(payload) => {
                info!("✓ 请求完成，返回 {} 个字段", payload.len());
                {
                    let mut view = self.view.borrow_mut();
                    view.show_results(&payload);
                    view.set_status(STATUS_COMPLETED);
                }
                self.lifecycle.set(Lifecycle::Succeeded);
                SubmitOutcome::Rendered(payload)
            }
            Err(err) => {
                warn!("❌ 请求失败: {}", err);
                let display = err.to_display();
                {
                    let mut view = self.view.borrow_mut();
                    view.show_error(&display);
                    view.set_status(STATUS_FAILED);
                }
                self.lifecycle.set(Lifecycle::Failed);
                SubmitOutcome::Failed(display)
            }
        };

        self.record(&snapshot, &outcome).await;
        outcome
    }

    async fn record(&self, snapshot: &SubmissionSnapshot, outcome: &SubmitOutcome) {
        let Some(log) = &self.submission_log else {
            return;
        };
        let logged = match outcome {
            SubmitOutcome::Rendered(payload) => LoggedOutcome::Rendered {
                keys: payload.len(),
            },
            SubmitOutcome::Failed(err) => LoggedOutcome::Failed {
                status: err.status,
                message: &err.message,
            },
            SubmitOutcome::Invalid(_) | SubmitOutcome::Ignored => return,
        };
        if let Err(e) = log.record(snapshot, logged).await {
            warn!("⚠️ 写入提交记录失败: {:#}", e);
        }
    }

    fn set_busy(&self, busy: bool) {
        self.busy.set(busy);
        let retry_enabled = !busy && self.last_snapshot.borrow().is_some();
        let mut view = self.view.borrow_mut();
        view.busy = busy;
        view.retry_enabled = retry_enabled;
    }
}
