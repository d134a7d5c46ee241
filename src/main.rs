use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use drive_form_bridge::{logger, App, AppResult, Config};

/// 把表单提交到 Drive 分析 Webhook
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,
    /// 覆盖配置中的 Webhook 地址
    #[arg(long)]
    endpoint: Option<String>,
    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
    /// Google Drive 文件夹链接或 ID（单次提交模式）
    #[arg(long)]
    folder: Option<String>,
    /// 消息内容（单次提交模式）
    #[arg(long)]
    message: Option<String>,
    /// 附件路径，可重复
    #[arg(long = "file")]
    files: Vec<PathBuf>,
}

/// 加载配置并应用命令行覆盖
fn load_config(cli: &Cli) -> AppResult<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(endpoint) = &cli.endpoint {
        config.webhook_url = endpoint.clone();
        config.validate()?;
    }
    config.verbose_logging |= cli.verbose;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 加载配置
    let config = load_config(&cli)?;

    // 初始化日志
    logger::init(config.verbose_logging);

    let mut app = App::initialize(config).await?;

    if cli.folder.is_some() || cli.message.is_some() {
        let succeeded = app
            .run_once(
                cli.folder.unwrap_or_default(),
                cli.message.unwrap_or_default(),
                cli.files,
            )
            .await?;
        return Ok(if succeeded {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    app.run().await?;
    Ok(ExitCode::SUCCESS)
}
