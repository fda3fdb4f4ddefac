//! 学生端题目渲染
//!
//! 渲染器把题目与当前作答转换成视图模型，并把学生的一次输入
//! 转换成新的作答值。作答值的形态见 [`AnswerValue`]。

pub mod choice;
pub mod completion;
pub mod diagram;
pub mod matching;
pub mod tfng;

use crate::error::AttemptError;
use crate::models::{AnswerValue, Question, TypedQuestion};

pub use choice::{ChoiceView, FreeTextView, ShortAnswerView};
pub use completion::{CompletionView, SegmentView, TableView};
pub use diagram::{DiagramView, PinView};
pub use matching::{MatchingRow, MatchingView};
pub use tfng::{StatementRow, TfngView};

/// 题目视图
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionView {
    Completion(CompletionView),
    Table(TableView),
    Matching(MatchingView),
    Diagram(DiagramView),
    Tfng(TfngView),
    MultipleChoice(ChoiceView),
    ShortAnswer(ShortAnswerView),
    FreeText(FreeTextView),
}

/// 学生的一次输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// 填写某个空位/标签，或为某个题目/陈述选择答案
    Fill { key: String, value: String },
    /// 点击选择题选项
    Select(String),
    /// 整题文本输入
    Text(String),
}

impl Response {
    pub fn fill(key: impl Into<String>, value: impl Into<String>) -> Self {
        Response::Fill {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 按题型生成视图
pub fn render(question: &Question, answer: Option<&AnswerValue>) -> QuestionView {
    match question.typed() {
        TypedQuestion::Completion(data, _) => QuestionView::Completion(completion::render_completion(&data, answer)),
        TypedQuestion::Table(data, _) => QuestionView::Table(completion::render_table(&data, answer)),
        TypedQuestion::Matching(data, _) => QuestionView::Matching(matching::render(&data, answer)),
        TypedQuestion::Diagram(data, _) => QuestionView::Diagram(diagram::render(&data, answer)),
        TypedQuestion::Tfng(data, _) => QuestionView::Tfng(tfng::render(&data, answer)),
        TypedQuestion::MultipleChoice(data, _) => QuestionView::MultipleChoice(choice::render_mcq(&data, answer)),
        TypedQuestion::ShortAnswer(data, _) => QuestionView::ShortAnswer(choice::render_short_answer(&data, answer)),
        TypedQuestion::FreeText(_) => QuestionView::FreeText(choice::render_free_text(answer)),
    }
}

/// 应用一次输入，返回新的作答值
pub fn respond(
    question: &Question,
    current: Option<&AnswerValue>,
    response: Response,
) -> Result<AnswerValue, AttemptError> {
    let invalid = |reason: String| AttemptError::InvalidResponse {
        question_id: question.id,
        reason,
    };
    let result = match (question.typed(), response) {
        (TypedQuestion::Completion(data, _), Response::Fill { key, value }) => {
            completion::fill_completion(&data, current, key, value)
        }
        (TypedQuestion::Table(data, _), Response::Fill { key, value }) => {
            completion::fill_table(&data, current, key, value)
        }
        (TypedQuestion::Matching(data, _), Response::Fill { key, value }) => {
            matching::choose(&data, current, key, value)
        }
        (TypedQuestion::Diagram(data, _), Response::Fill { key, value }) => diagram::fill(&data, current, key, value),
        (TypedQuestion::Tfng(data, _), Response::Fill { key, value }) => tfng::choose(&data, current, key, value),
        (TypedQuestion::MultipleChoice(data, _), Response::Select(label)) => choice::select(&data, current, label),
        (TypedQuestion::ShortAnswer(..), Response::Text(text)) | (TypedQuestion::FreeText(_), Response::Text(text)) => {
            Ok(AnswerValue::Text(text))
        }
        (typed, other) => Err(format!("{} 题不接受输入 {:?}", typed.family(), other)),
    };
    result.map_err(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(question_type: &str, tsd: serde_json::Value) -> Question {
        serde_json::from_value(json!({
            "id": 7,
            "question_number": 1,
            "question_type": question_type,
            "type_specific_data": tsd
        }))
        .unwrap()
    }

    #[test]
    fn dispatches_by_family() {
        let q = question("listening_form_completion", json!({"template_text": "A [BLANK_1]"}));
        assert!(matches!(render(&q, None), QuestionView::Completion(_)));
        let q = question("reading_table_completion", json!({}));
        assert!(matches!(render(&q, None), QuestionView::Table(_)));
        let q = question("something_new", json!({}));
        assert!(matches!(render(&q, None), QuestionView::FreeText(_)));
    }

    #[test]
    fn mismatched_response_is_rejected() {
        let q = question("listening_form_completion", json!({"template_text": "A [BLANK_1]"}));
        let err = respond(&q, None, Response::Select("A".into())).unwrap_err();
        assert!(matches!(err, AttemptError::InvalidResponse { question_id: 7, .. }));
    }

    #[test]
    fn free_text_stores_plain_text() {
        let q = question("legacy_type", json!(null));
        let value = respond(&q, None, Response::Text("forty".into())).unwrap();
        assert_eq!(value, AnswerValue::text("forty"));
    }
}
