use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 题目数据校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 编辑器操作错误
    #[error("编辑器错误: {0}")]
    Editor(#[from] EditorError),
    /// 作答流程错误
    #[error("作答错误: {0}")]
    Attempt(#[from] AttemptError),
    /// 口语录音流程错误
    #[error("口语流程错误: {0}")]
    Speaking(#[from] SpeakingError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务端返回非 2xx 状态
    #[error("API返回错误响应 ({endpoint}): status={status}, detail={detail:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        detail: Option<String>,
    },
    /// 未登录或令牌失效
    #[error("未授权访问 ({endpoint})，请重新登录")]
    Unauthorized { endpoint: String },
    /// 当前会话没有令牌
    #[error("当前会话未登录")]
    NotLoggedIn,
    /// 响应体解析失败
    #[error("响应解析失败 ({endpoint}): {source}")]
    DecodeFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 上传接口没有返回文件地址
    #[error("上传成功但响应中缺少 url 字段 ({endpoint})")]
    MissingUploadUrl { endpoint: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 题目数据校验错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("填空题缺少模板文本")]
    MissingTemplate,
    #[error("填空题至少需要一个 [BLANK_N] 空位")]
    NoBlanks,
    #[error("空位 {0} 缺少正确答案")]
    MissingBlankAnswer(String),
    #[error("匹配题需要至少一个题目和一个选项")]
    MatchingIncomplete,
    #[error("选项数量 ({options}) 少于题目数量 ({items})，且未允许选项复用")]
    NotEnoughOptions { items: usize, options: usize },
    #[error("题目 {0} 缺少匹配答案")]
    MissingMapping(u32),
    #[error("题目 {item} 的答案 {label} 不是有效选项")]
    InvalidMapping { item: u32, label: String },
    #[error("选择题至少需要 2 个选项")]
    TooFewChoices,
    #[error("单选题必须恰好有 1 个正确答案，当前 {0} 个")]
    SingleSelectAnswerCount(usize),
    #[error("选择题至少需要 1 个正确答案")]
    NoCorrectOption,
    #[error("正确答案 {0} 不是有效选项")]
    InvalidCorrectOption(String),
    #[error("标注题需要图片")]
    MissingImage,
    #[error("标注题至少需要 1 个标签")]
    NoLabels,
    #[error("标签 {0} 缺少答案")]
    MissingLabelAnswer(String),
    #[error("判断题至少需要 1 个陈述")]
    NoStatements,
    #[error("陈述 {0} 缺少答案")]
    MissingStatementAnswer(u32),
    #[error("陈述 {number} 的答案 {answer} 不属于当前判断词表")]
    InvalidStatementAnswer { number: u32, answer: String },
    #[error("简答题缺少正确答案")]
    MissingShortAnswer,
    #[error("题型 {question_type} 需要填写 [{table}] 子表")]
    MissingDraft {
        question_type: String,
        table: &'static str,
    },
    #[error("{0} 下不能直接创建题目")]
    UnsupportedSection(String),
    #[error("任务编号 {0} 无效（写作 1-2，口语 1-3）")]
    InvalidTaskNumber(u32),
    #[error("任务 {0} 缺少题目内容")]
    EmptyPrompt(u32),
    #[error("评分 {criterion} = {score} 超出 0-9 范围")]
    ScoreOutOfRange { criterion: &'static str, score: f64 },
}

/// 编辑器操作错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("索引 {index} 超出范围 (共 {len} 项)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("至少需要保留 {min} 项")]
    MinimumReached { min: usize },
    #[error("选项数量已达上限 {max}")]
    TooManyOptions { max: usize },
    #[error("字数限制 {0} 不在 1-5 范围内")]
    WordLimitOutOfRange(u8),
    #[error("空位 {0} 不存在")]
    UnknownBlank(String),
    #[error("题目编号 {0} 不存在")]
    UnknownItem(u32),
    #[error("选项 {0} 不存在")]
    UnknownOption(String),
    #[error("选项 {label} 已被题目 {item} 使用")]
    OptionAlreadyUsed { label: String, item: u32 },
    #[error("标签 {0} 不存在")]
    UnknownLabel(String),
    #[error("陈述编号 {0} 不存在")]
    UnknownStatement(u32),
    #[error("答案 {0} 不属于当前判断词表")]
    InvalidVerdict(String),
    #[error("请先上传图片")]
    NoImage,
    #[error("图片尺寸无效: {width}x{height}")]
    InvalidImageSize { width: f64, height: f64 },
    #[error("答案不能为空")]
    EmptyAnswer,
}

/// 作答流程错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttemptError {
    #[error("试卷没有任何部分")]
    NoSections,
    #[error("题目 {0} 不在本次作答中")]
    UnknownQuestion(i64),
    #[error("写作任务 {0} 不在本次作答中")]
    UnknownWritingTask(i64),
    #[error("作答已提交，不能再修改")]
    AlreadySubmitted,
    #[error("题目 {question_id} 的作答无效: {reason}")]
    InvalidResponse { question_id: i64, reason: String },
}

/// 口语流程错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeakingError {
    #[error("非法状态转换: {from} -> {event}")]
    IllegalTransition {
        from: &'static str,
        event: &'static str,
    },
    #[error("麦克风已被占用")]
    MicrophoneBusy,
    #[error("无法获取录音: {0}")]
    CaptureFailed(String),
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("配置项 {key} 无效: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("缺少配置项 {0}")]
    Missing(&'static str),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON处理失败: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(format!("IO错误: {}", err))
    }
}

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;

// ========== 便捷构造函数 ==========

impl ApiError {
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn bad_response(endpoint: impl Into<String>, status: u16, detail: Option<String>) -> Self {
        ApiError::BadResponse {
            endpoint: endpoint.into(),
            status,
            detail,
        }
    }

    /// 是否为鉴权失败（需要重新登录）
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. } | ApiError::NotLoggedIn)
    }
}

impl FileError {
    pub fn read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}
