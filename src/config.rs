use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// 批处理运行模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// 从 TOML 题目草稿批量创建题目
    Author,
    /// 按 TOML 答题卡完成一次考试作答
    Attempt,
    /// 按 TOML 评分表批改待评分的写作/口语
    Grade,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "author" => Ok(RunMode::Author),
            "attempt" => Ok(RunMode::Attempt),
            "grade" => Ok(RunMode::Grade),
            other => Err(ConfigError::Invalid {
                key: "RUN_MODE",
                reason: format!("未知模式 {}", other),
            }),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Author => "author",
            RunMode::Attempt => "attempt",
            RunMode::Grade => "grade",
        };
        f.write_str(name)
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端 API 基础地址（包含 /api/v1）
    pub api_base_url: String,
    /// 访问令牌持久化文件
    pub token_file: String,
    /// 登录邮箱
    pub login_email: Option<String>,
    /// 登录密码
    pub login_password: Option<String>,
    /// 运行模式
    pub run_mode: RunMode,
    /// TOML文件存放目录
    pub toml_folder: String,
    /// 同时处理的文件数量
    pub max_concurrent: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 失败记录文件
    pub warn_file: String,
    /// HTTP 超时（秒）
    pub http_timeout_secs: u64,
    /// 口语录音文件目录（按任务 ID 命名）
    pub recordings_folder: String,
    /// 口语是否跳过准备时间
    pub skip_speaking_preparation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            token_file: ".access_token".to_string(),
            login_email: None,
            login_password: None,
            run_mode: RunMode::Author,
            toml_folder: "input_toml".to_string(),
            max_concurrent: 8,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            warn_file: "warn.txt".to_string(),
            http_timeout_secs: 30,
            recordings_folder: "recordings".to_string(),
            skip_speaking_preparation: true,
        }
    }
}

/// 解析可选的环境变量；未设置时返回 `None`，设置了但无法解析时报错
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("无法解析的值 {}", raw),
        }),
    }
}

impl Config {
    /// 从进程环境变量读取配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 按给定的查找函数读取配置，未设置的项使用默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default = Self::default();
        let run_mode = match lookup("RUN_MODE") {
            Some(raw) => raw.parse()?,
            None => default.run_mode,
        };
        Ok(Self {
            api_base_url: lookup("API_BASE_URL").unwrap_or(default.api_base_url),
            token_file: lookup("TOKEN_FILE").unwrap_or(default.token_file),
            login_email: lookup("LOGIN_EMAIL").or(default.login_email),
            login_password: lookup("LOGIN_PASSWORD").or(default.login_password),
            run_mode,
            toml_folder: lookup("TOML_FOLDER").unwrap_or(default.toml_folder),
            max_concurrent: parse_var(&lookup, "MAX_CONCURRENT")?.unwrap_or(default.max_concurrent),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING")?.unwrap_or(default.verbose_logging),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            warn_file: lookup("WARN_FILE").unwrap_or(default.warn_file),
            http_timeout_secs: parse_var(&lookup, "HTTP_TIMEOUT_SECS")?.unwrap_or(default.http_timeout_secs),
            recordings_folder: lookup("RECORDINGS_FOLDER").unwrap_or(default.recordings_folder),
            skip_speaking_preparation: parse_var(&lookup, "SKIP_SPEAKING_PREPARATION")?
                .unwrap_or(default.skip_speaking_preparation),
        })
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: "API_BASE_URL",
                reason: format!("必须以 http:// 或 https:// 开头: {}", self.api_base_url),
            });
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_CONCURRENT",
                reason: "并发数必须大于 0".to_string(),
            });
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "HTTP_TIMEOUT_SECS",
                reason: "超时必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 登录凭据，两项都配置时返回
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.login_email, &self.login_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_mode_parses_case_insensitively() {
        assert_eq!("Attempt".parse::<RunMode>().unwrap(), RunMode::Attempt);
        assert_eq!(" grade ".parse::<RunMode>().unwrap(), RunMode::Grade);
        assert!("publish".parse::<RunMode>().is_err());
    }

    #[test]
    fn misspelled_run_mode_is_rejected() {
        let err = Config::from_lookup(|key| (key == "RUN_MODE").then(|| "grde".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "RUN_MODE", .. }));

        let config = Config::from_lookup(|key| (key == "RUN_MODE").then(|| "Grade".to_string())).unwrap();
        assert_eq!(config.run_mode, RunMode::Grade);
    }

    #[test]
    fn unparsable_numbers_and_flags_are_rejected() {
        let err = Config::from_lookup(|key| (key == "MAX_CONCURRENT").then(|| "eight".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MAX_CONCURRENT", .. }));

        let err = Config::from_lookup(|key| (key == "VERBOSE_LOGGING").then(|| "yes".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "VERBOSE_LOGGING", .. }));
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.run_mode, RunMode::Author);
        assert_eq!(config.max_concurrent, Config::default().max_concurrent);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = Config {
            api_base_url: "localhost:8000".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "API_BASE_URL", .. })
        ));
    }

    #[test]
    fn credentials_require_both_fields() {
        let mut config = Config::default();
        config.login_email = Some("a@b.c".to_string());
        assert!(config.credentials().is_none());
        config.login_password = Some("pw".to_string());
        assert_eq!(config.credentials(), Some(("a@b.c", "pw")));
    }
}
