//! 各题型的 `type_specific_data` 与 `answer_data` 结构
//!
//! 字段名与后端存储的 JSON 完全一致。缺失字段取默认值，
//! 这样旧数据或学生端（不带答案）拿到的题目也能解码。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_BLANK_MAX_WORDS: u8 = 3;
pub const DEFAULT_LABEL_MAX_WORDS: u8 = 2;
pub const DEFAULT_SHORT_ANSWER_MAX_WORDS: u8 = 3;
/// 单个空位/标签允许的字数范围
pub const WORD_LIMIT_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

fn default_blank_max_words() -> u8 {
    DEFAULT_BLANK_MAX_WORDS
}

fn default_label_max_words() -> u8 {
    DEFAULT_LABEL_MAX_WORDS
}

fn default_short_answer_max_words() -> u8 {
    DEFAULT_SHORT_ANSWER_MAX_WORDS
}

/// 选项（选择题与匹配题共用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub option_label: String,
    #[serde(default)]
    pub option_text: String,
}

impl ChoiceOption {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            option_label: label.into(),
            option_text: text.into(),
        }
    }
}

/// 单个空位的配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlankConfig {
    pub blank_id: String,
    #[serde(default = "default_blank_max_words")]
    pub max_words: u8,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl BlankConfig {
    /// 新发现空位的默认配置
    pub fn with_defaults(blank_id: impl Into<String>) -> Self {
        Self {
            blank_id: blank_id.into(),
            max_words: DEFAULT_BLANK_MAX_WORDS,
            case_sensitive: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionData {
    #[serde(default)]
    pub template_text: String,
    #[serde(default)]
    pub blanks: Vec<BlankConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStructure {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Default for TableStructure {
    fn default() -> Self {
        Self {
            headers: vec!["Column 1".to_string(), "Column 2".to_string()],
            rows: vec![vec![String::new(), String::new()]],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default)]
    pub table_structure: TableStructure,
    #[serde(default)]
    pub blanks: Vec<BlankConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingItem {
    pub item_number: u32,
    #[serde(default)]
    pub item_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingData {
    #[serde(default)]
    pub items: Vec<MatchingItem>,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub allow_option_reuse: bool,
}

/// 标注点，坐标为图片宽高的百分比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramLabel {
    pub label_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramData {
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub labels: Vec<DiagramLabel>,
    #[serde(default = "default_label_max_words")]
    pub max_words_per_label: u8,
}

impl Default for DiagramData {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            labels: Vec::new(),
            max_words_per_label: DEFAULT_LABEL_MAX_WORDS,
        }
    }
}

/// 判断题词表
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfngMode {
    #[default]
    TrueFalseNotGiven,
    YesNoNotGiven,
}

impl TfngMode {
    /// 题型字符串含 `yes_no` 时默认使用 YES/NO 词表
    pub fn for_question_type(question_type: &str) -> Self {
        if question_type.to_lowercase().contains("yes_no") {
            TfngMode::YesNoNotGiven
        } else {
            TfngMode::TrueFalseNotGiven
        }
    }

    pub fn vocabulary(self) -> [&'static str; 3] {
        match self {
            TfngMode::TrueFalseNotGiven => ["TRUE", "FALSE", "NOT GIVEN"],
            TfngMode::YesNoNotGiven => ["YES", "NO", "NOT GIVEN"],
        }
    }

    pub fn accepts(self, verdict: &str) -> bool {
        self.vocabulary().contains(&verdict)
    }

    /// 把另一词表中的答案换算到当前词表
    pub fn translate(self, verdict: &str) -> Option<&'static str> {
        let idx = [TfngMode::TrueFalseNotGiven, TfngMode::YesNoNotGiven]
            .iter()
            .find_map(|m| m.vocabulary().iter().position(|v| *v == verdict))?;
        Some(self.vocabulary()[idx])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TfngStatement {
    pub statement_number: u32,
    #[serde(default)]
    pub statement_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfngData {
    #[serde(default)]
    pub statements: Vec<TfngStatement>,
    #[serde(default)]
    pub answer_type: TfngMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McqData {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub allow_multiple: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortAnswerData {
    #[serde(default = "default_short_answer_max_words")]
    pub max_words: u8,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Default for ShortAnswerData {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_SHORT_ANSWER_MAX_WORDS,
            case_sensitive: false,
        }
    }
}

// ========== answer_data ==========

/// 填空/表格：空位 ID → 可接受答案（第一个为主答案，仅用于展示）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlankAnswers {
    #[serde(default)]
    pub blanks: BTreeMap<String, Vec<String>>,
}

/// 匹配：题目编号 → 选项字母
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingAnswers {
    #[serde(default)]
    pub mappings: BTreeMap<u32, String>,
}

/// 标注：标签 ID → 可接受答案
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramAnswers {
    #[serde(default)]
    pub labels: BTreeMap<String, Vec<String>>,
}

/// 判断：陈述编号 → 判断词
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TfngAnswers {
    #[serde(default)]
    pub answers: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqAnswers {
    #[serde(default)]
    pub correct_options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortAnswers {
    #[serde(default)]
    pub correct_answers: Vec<String>,
}

/// 旧式单答案题目
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTextAnswers {
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub alternative_answers: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl FreeTextAnswers {
    pub fn all(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.correct_answer).chain(self.alternative_answers.iter())
    }
}
