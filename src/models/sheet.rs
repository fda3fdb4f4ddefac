//! TOML 输入文件的结构
//!
//! - `QuestionSet`：一组待创建的题目（一个听力 Part 或一篇阅读文章）
//! - `AnswerSheet`：一次考试作答的答题卡
//! - `GradeSheet`：待提交的教师评分

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::answer::AnswerValue;
use crate::models::grade::{SpeakingGrade, WritingGrade};
use crate::models::schema::TfngMode;
use crate::models::test::SectionType;

/// 可从 TOML 文件加载的文档
pub trait TomlDocument: serde::de::DeserializeOwned {
    /// 记录来源文件
    fn set_file_path(&mut self, path: String);
    /// 日志中显示的条目数
    fn entry_count(&self) -> usize;
}

// ========== 题目草稿 ==========

/// 听力 Part 信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDraft {
    pub part_number: u32,
    /// 已上传的音频地址
    #[serde(default)]
    pub audio_url: Option<String>,
    /// 本地音频文件，运行时上传
    #[serde(default)]
    pub audio_file: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
}

/// 阅读文章信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageDraft {
    pub passage_number: u32,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
}

/// 填空题草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionDraft {
    pub template_text: String,
    /// 空位 ID → 可接受答案
    #[serde(default)]
    pub answers: BTreeMap<String, Vec<String>>,
    /// 空位 ID → 字数限制（未列出的用默认值）
    #[serde(default)]
    pub max_words: BTreeMap<String, u8>,
    /// 区分大小写的空位
    #[serde(default)]
    pub case_sensitive: Vec<String>,
}

/// 表格填空草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDraft {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub answers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub max_words: BTreeMap<String, u8>,
    #[serde(default)]
    pub case_sensitive: Vec<String>,
}

/// 匹配题草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingDraft {
    pub items: Vec<String>,
    pub options: Vec<String>,
    #[serde(default)]
    pub allow_option_reuse: bool,
    /// 题目编号 → 选项字母
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
}

/// 标注点草稿（像素坐标）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinDraft {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// 标注题草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramDraft {
    /// 已上传的图片地址
    #[serde(default)]
    pub image_url: Option<String>,
    /// 本地图片，运行时上传
    #[serde(default)]
    pub image_file: Option<String>,
    /// 点击坐标所参照的图片尺寸 [宽, 高]
    pub image_size: [f64; 2],
    #[serde(default)]
    pub max_words_per_label: Option<u8>,
    #[serde(default)]
    pub pins: Vec<PinDraft>,
}

/// 判断题陈述草稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementDraft {
    pub text: String,
    pub answer: String,
}

/// 判断题草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfngDraft {
    #[serde(default)]
    pub answer_type: Option<TfngMode>,
    pub statements: Vec<StatementDraft>,
}

/// 选择题草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDraft {
    pub options: Vec<String>,
    pub correct: Vec<String>,
    #[serde(default)]
    pub allow_multiple: bool,
}

/// 简答题草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortAnswerDraft {
    pub answers: Vec<String>,
    #[serde(default)]
    pub max_words: Option<u8>,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// 单道题草稿，按题型填写对应的子表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question_number: u32,
    pub question_type: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub completion: Option<CompletionDraft>,
    #[serde(default)]
    pub table: Option<TableDraft>,
    #[serde(default)]
    pub matching: Option<MatchingDraft>,
    #[serde(default)]
    pub diagram: Option<DiagramDraft>,
    #[serde(default)]
    pub tfng: Option<TfngDraft>,
    #[serde(default)]
    pub choice: Option<ChoiceDraft>,
    #[serde(default)]
    pub short_answer: Option<ShortAnswerDraft>,
}

/// 写作任务草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WritingTaskDraft {
    pub task_number: u32,
    /// 缺省时按任务号取 `writing_task1_academic` / `writing_task2_essay`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    pub prompt_text: String,
    /// 已上传的图表地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// 本地图表，运行时上传
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_limit_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_limit_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
}

/// 口语任务草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakingTaskDraft {
    pub part_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    pub prompt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_time_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaking_time_seconds: Option<u32>,
    /// 仅 Part 2 的题卡使用
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cue_card_points: Vec<String>,
}

/// 一组题目（一个文件）
///
/// 听力/阅读填写 `part`/`passage` 与 `questions`；
/// 写作/口语填写 `writing_tasks`/`speaking_tasks`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub name: String,
    pub section_id: i64,
    pub section_type: SectionType,
    /// 已创建的 Part / 文章 ID；部分失败后写回，重跑时直接复用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<PartDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<PassageDraft>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writing_tasks: Vec<WritingTaskDraft>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speaking_tasks: Vec<SpeakingTaskDraft>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl TomlDocument for QuestionSet {
    fn set_file_path(&mut self, path: String) {
        self.file_path = Some(path);
    }

    fn entry_count(&self) -> usize {
        self.questions.len() + self.writing_tasks.len() + self.speaking_tasks.len()
    }
}

// ========== 答题卡 ==========

/// 答题卡
///
/// 听力/阅读按题号作答，写作按任务号，口语按任务顺序给出录音文件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub test_template_id: i64,
    #[serde(default)]
    pub listening: BTreeMap<String, AnswerValue>,
    #[serde(default)]
    pub reading: BTreeMap<String, AnswerValue>,
    #[serde(default)]
    pub writing: BTreeMap<String, String>,
    #[serde(default)]
    pub speaking: BTreeMap<String, String>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl TomlDocument for AnswerSheet {
    fn set_file_path(&mut self, path: String) {
        self.file_path = Some(path);
    }

    fn entry_count(&self) -> usize {
        self.listening.len() + self.reading.len() + self.writing.len() + self.speaking.len()
    }
}

// ========== 评分表 ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingGradeEntry {
    pub submission_id: i64,
    #[serde(flatten)]
    pub grade: WritingGrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakingGradeEntry {
    pub submission_id: i64,
    #[serde(flatten)]
    pub grade: SpeakingGrade,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeSheet {
    #[serde(default)]
    pub writing: Vec<WritingGradeEntry>,
    #[serde(default)]
    pub speaking: Vec<SpeakingGradeEntry>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl TomlDocument for GradeSheet {
    fn set_file_path(&mut self, path: String) {
        self.file_path = Some(path);
    }

    fn entry_count(&self) -> usize {
        self.writing.len() + self.speaking.len()
    }
}
