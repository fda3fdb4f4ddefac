use crate::models::schema::{McqData, ShortAnswerData};
use crate::models::AnswerValue;
use crate::utils::word_count;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRow {
    pub label: String,
    pub text: String,
    pub checked: bool,
}

/// 选择题视图（单选为单选按钮，多选为复选框）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub allow_multiple: bool,
    pub options: Vec<ChoiceRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortAnswerView {
    pub value: String,
    pub max_words: u8,
    pub word_count: usize,
    pub over_limit: bool,
}

/// 未知题型的退化视图：一个文本框
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeTextView {
    pub value: String,
}

pub fn render_mcq(data: &McqData, answer: Option<&AnswerValue>) -> ChoiceView {
    let selected = answer.map(AnswerValue::selected_labels).unwrap_or_default();
    ChoiceView {
        allow_multiple: data.allow_multiple,
        options: data
            .options
            .iter()
            .map(|o| ChoiceRow {
                label: o.option_label.clone(),
                text: o.option_text.clone(),
                checked: selected.contains(&o.option_label),
            })
            .collect(),
    }
}

/// 点击选项：单选直接替换，多选切换并保持排序
pub fn select(data: &McqData, current: Option<&AnswerValue>, label: String) -> Result<AnswerValue, String> {
    if !data.options.iter().any(|o| o.option_label == label) {
        return Err(format!("选项 {} 不存在", label));
    }
    if !data.allow_multiple {
        return Ok(AnswerValue::Text(label));
    }
    let mut selected = current.map(AnswerValue::selected_labels).unwrap_or_default();
    if let Some(pos) = selected.iter().position(|l| *l == label) {
        selected.remove(pos);
    } else {
        selected.push(label);
    }
    selected.sort();
    Ok(AnswerValue::Choices(selected))
}

pub fn render_short_answer(data: &ShortAnswerData, answer: Option<&AnswerValue>) -> ShortAnswerView {
    let value = answer.map(AnswerValue::as_text).unwrap_or("").to_string();
    let count = word_count(&value);
    ShortAnswerView {
        over_limit: count > data.max_words as usize,
        word_count: count,
        max_words: data.max_words,
        value,
    }
}

pub fn render_free_text(answer: Option<&AnswerValue>) -> FreeTextView {
    FreeTextView {
        value: answer.map(AnswerValue::as_text).unwrap_or("").to_string(),
    }
}
