//! 学生作答值
//!
//! 与渲染器交换的值形态：
//! - 单选 / 简答 / 写作：字符串
//! - 多选：排好序的选项字母数组
//! - 填空、表格、匹配、标注、判断：`{标识: 文本}` 映射

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Choices(Vec<String>),
    /// 旧版多选格式 `{"selected": [...]}`
    Selection { selected: Vec<String> },
    Slots(BTreeMap<String, String>),
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    /// 按 key 取映射中的值，缺失或形态不符时为空串
    pub fn slot(&self, key: &str) -> &str {
        match self {
            AnswerValue::Slots(map) => map.get(key).map(String::as_str).unwrap_or(""),
            _ => "",
        }
    }

    /// 文本值（非文本形态为空串）
    pub fn as_text(&self) -> &str {
        match self {
            AnswerValue::Text(s) => s,
            _ => "",
        }
    }

    /// 当前选中的选项字母，兼容单字符串与旧版格式
    pub fn selected_labels(&self) -> Vec<String> {
        match self {
            AnswerValue::Text(s) if !s.is_empty() => vec![s.clone()],
            AnswerValue::Text(_) => Vec::new(),
            AnswerValue::Choices(labels) => labels.clone(),
            AnswerValue::Selection { selected } => selected.clone(),
            AnswerValue::Slots(_) => Vec::new(),
        }
    }

    /// 映射中已填写的所有值
    pub fn slot_values(&self) -> impl Iterator<Item = &str> {
        let map = match self {
            AnswerValue::Slots(map) => Some(map),
            _ => None,
        };
        map.into_iter().flat_map(|m| m.values().map(String::as_str))
    }

    /// 提交用的字符串：文本原样，其它形态序列化为 JSON
    pub fn to_submission_string(&self) -> String {
        match self {
            AnswerValue::Text(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

/// 在已有作答上写入一个映射项，返回新的作答
pub fn with_slot(current: Option<&AnswerValue>, key: impl Into<String>, value: impl Into<String>) -> AnswerValue {
    let mut map = match current {
        Some(AnswerValue::Slots(map)) => map.clone(),
        _ => BTreeMap::new(),
    };
    map.insert(key.into(), value.into());
    AnswerValue::Slots(map)
}
