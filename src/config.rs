use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::ConfigError;

/// 未显式指定时尝试加载的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "drive_form_bridge.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 表单提交的目标 Webhook
    pub webhook_url: String,
    /// 从链接中提取文件夹 ID 时认可的 Drive 域名
    pub drive_host: String,
    /// 复制按钮反馈持续时间（毫秒）
    pub copy_feedback_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 提交记录文件，默认不记录
    pub submission_log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: "https://ben-unconflictive-many.ngrok-free.dev/webhook/drive-chatbot-api"
                .to_string(),
            drive_host: "drive.google.com".to_string(),
            copy_feedback_ms: 1200,
            verbose_logging: false,
            submission_log_file: None,
        }
    }
}

impl Config {
    /// 按 默认值 → TOML 文件 → 环境变量 的顺序加载配置
    ///
    /// 未指定路径时，只有工作目录下存在 `drive_form_bridge.toml` 才会读取。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        let config = base.with_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path_str.clone(),
            source,
        })?;
        debug!("读取配置文件: {}", path_str);
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path_str,
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let copy_feedback_ms = match var("COPY_FEEDBACK_MS") {
            Some(value) => parse_var("COPY_FEEDBACK_MS", value, "u64")?,
            None => self.copy_feedback_ms,
        };
        let verbose_logging = match var("VERBOSE_LOGGING") {
            Some(value) => parse_var("VERBOSE_LOGGING", value, "bool")?,
            None => self.verbose_logging,
        };
        let submission_log_file = match var("SUBMISSION_LOG_FILE") {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value),
            None => self.submission_log_file,
        };

        Ok(Self {
            webhook_url: var("WEBHOOK_URL").unwrap_or(self.webhook_url),
            drive_host: var("DRIVE_HOST").unwrap_or(self.drive_host),
            copy_feedback_ms,
            verbose_logging,
            submission_log_file,
        })
    }

    /// 只接受绝对的 http(s) 地址
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.webhook_url).map_err(|e| ConfigError::InvalidWebhookUrl {
            url: self.webhook_url.clone(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidWebhookUrl {
                url: self.webhook_url.clone(),
                reason: format!("不支持的协议: {}", other),
            }),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    var_name: &str,
    value: String,
    expected_type: &str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
        var_name: var_name.to_string(),
        value,
        expected_type: expected_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.drive_host, "drive.google.com");
        assert_eq!(config.copy_feedback_ms, 1200);
        assert_eq!(config.submission_log_file, None);
    }

    #[test]
    fn test_from_file_reads_toml() {
        let path = std::env::temp_dir().join(format!("dfb-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "webhook_url = \"http://localhost:5678/hook\"\nsubmission_log_file = \"out.log\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.webhook_url, "http://localhost:5678/hook");
        assert_eq!(config.submission_log_file.as_deref(), Some("out.log"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_from_file_reports_path_on_failure() {
        let path = std::env::temp_dir().join("dfb-config-definitely-missing.toml");
        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { ref path, .. } if path.ends_with("dfb-config-definitely-missing.toml")));
    }

    #[test]
    fn test_toml_overrides_only_given_keys() {
        let config = Config::from_toml_str(
            r#"
            webhook_url = "http://localhost:5678/webhook/test"
            verbose_logging = true
            "#,
        )
        .unwrap();
        assert_eq!(config.webhook_url, "http://localhost:5678/webhook/test");
        assert!(config.verbose_logging);
        assert_eq!(config.drive_host, "drive.google.com");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_vars(vars(&[
                ("WEBHOOK_URL", "http://127.0.0.1:9000/hook"),
                ("COPY_FEEDBACK_MS", "500"),
                ("SUBMISSION_LOG_FILE", ""),
            ]))
            .unwrap();
        assert_eq!(config.webhook_url, "http://127.0.0.1:9000/hook");
        assert_eq!(config.copy_feedback_ms, 500);
        assert_eq!(config.submission_log_file, None);
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let err = Config::default()
            .with_vars(vars(&[("VERBOSE_LOGGING", "sometimes")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "VERBOSE_LOGGING"));
    }

    #[test]
    fn test_rejects_relative_or_non_http_url() {
        let mut config = Config::default();
        config.webhook_url = "/webhook/relative".to_string();
        assert!(config.validate().is_err());

        config.webhook_url = "ftp://example.com/hook".to_string();
        assert!(config.validate().is_err());
    }
}
