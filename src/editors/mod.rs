//! 作者端题目编辑器
//!
//! 每个编辑器持有自己的草稿，作者的每次操作只修改草稿；
//! 需要保存时调用 `commit()` 得到两段 JSON（`type_specific_data` 与 `answer_data`）。
//! 外部数据只能通过 `load()` 显式重新载入，编辑过程中不会被覆盖。

pub mod blanks;
pub mod choice;
pub mod completion;
pub mod diagram;
pub mod matching;
pub mod table;
pub mod tfng;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::EditorError;

pub use choice::{McqEditor, ShortAnswerEditor};
pub use completion::CompletionEditor;
pub use diagram::DiagramEditor;
pub use matching::MatchingEditor;
pub use table::TableEditor;
pub use tfng::TfngEditor;

/// 编辑器提交给上层的数据
#[derive(Debug, Clone, PartialEq)]
pub struct EditorCommit {
    pub type_specific_data: Value,
    pub answer_data: Value,
}

impl EditorCommit {
    pub fn from_parts<D: Serialize, A: Serialize>(data: &D, answers: &A) -> serde_json::Result<Self> {
        Ok(Self {
            type_specific_data: serde_json::to_value(data)?,
            answer_data: serde_json::to_value(answers)?,
        })
    }

    /// 解码为结构化的两部分，`null` 视为默认值
    pub fn to_parts<D, A>(&self) -> serde_json::Result<(D, A)>
    where
        D: DeserializeOwned + Default,
        A: DeserializeOwned + Default,
    {
        Ok((decode_or_default(&self.type_specific_data)?, decode_or_default(&self.answer_data)?))
    }
}

fn decode_or_default<T: DeserializeOwned + Default>(value: &Value) -> serde_json::Result<T> {
    if value.is_null() {
        Ok(T::default())
    } else {
        T::deserialize(value)
    }
}

/// 编辑器的公共能力
pub trait QuestionEditor {
    /// 用当前草稿生成提交数据
    fn commit(&self) -> serde_json::Result<EditorCommit>;

    /// 显式重新载入外部数据，丢弃当前草稿
    fn load(&mut self, commit: &EditorCommit) -> serde_json::Result<()>;
}

/// 追加一个可接受答案（去掉首尾空白，不能为空）
pub(crate) fn push_answer(list: &mut Vec<String>, text: &str) -> Result<(), EditorError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EditorError::EmptyAnswer);
    }
    list.push(trimmed.to_string());
    Ok(())
}

pub(crate) fn remove_answer_at(list: &mut Vec<String>, index: usize) -> Result<(), EditorError> {
    check_index(index, list.len())?;
    list.remove(index);
    Ok(())
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<(), EditorError> {
    if index >= len {
        return Err(EditorError::IndexOutOfRange { index, len });
    }
    Ok(())
}

/// 第 n 个选项字母（0 → A）；超过 Z 后带轮次后缀（26 → A2）
pub(crate) fn option_label(index: usize) -> String {
    let letter = char::from(b'A' + (index % 26) as u8);
    match index / 26 {
        0 => letter.to_string(),
        round => format!("{}{}", letter, round + 1),
    }
}

/// 选项上限（A-Z）
pub const MAX_OPTIONS: usize = 26;
