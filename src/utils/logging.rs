/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;

/// 记录程序启动信息
pub fn log_startup(config: &Config, session_id: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - Drive 表单提交");
    info!("🔗 Webhook: {}", config.webhook_url);
    info!("🆔 会话 ID: {}", session_id);
    if let Some(path) = &config.submission_log_file {
        info!("📝 提交记录: {}", path);
    }
    info!("{}", "=".repeat(60));
}

/// 记录程序结束信息
pub fn log_shutdown(submissions: usize) {
    info!("{}", "─".repeat(60));
    info!(
        "👋 会话结束 - {}, 共发出 {} 次请求",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        submissions
    );
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
