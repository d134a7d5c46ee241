//! # Drive Form Bridge
//!
//! 把表单（Drive 文件夹、消息、附件）提交到固定 Webhook，并展示返回的扁平键值结果
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 构建请求、通过 `Transport` 发送
//! - `ReqwestTransport` - 唯一真正访问网络的地方
//!
//! ### ② 业务能力层（Services）
//! - `InputNormalizer` - 校验表单、从链接中提取文件夹 ID
//! - `classify_response` - 把响应归类为结果或错误
//! - `SubmissionLog` - 追加提交记录
//!
//! ### ③ 流程层（Workflow）
//! - `SubmissionController` - 会话 ID、最近快照、忙碌标记和生命周期状态机
//!
//! ### ④ 展示层（Presentation）
//! - `ViewState` - 字段错误、状态行、结果列表、错误面板、按钮状态
//! - `CopyAffordance` - 结果行上的复制按钮
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod presentation;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult, DisplayError, SubmitError, ValidationError};
pub use models::{Attachment, RawForm, ResultPayload, SessionId, SubmissionSnapshot};
pub use presentation::ViewState;
pub use services::InputNormalizer;
pub use workflow::{Lifecycle, SubmissionController, SubmitOutcome};
