use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::models::question_type::QuestionFamily;
use crate::models::schema::*;

/// 听力/阅读题目（后端返回的形态）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    #[serde(default)]
    pub section_id: Option<i64>,
    /// 听力题所属 Part
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<i64>,
    /// 阅读题所属文章
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage_id: Option<i64>,
    pub question_number: u32,
    pub question_type: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub marks: Option<f64>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub type_specific_data: Value,
    /// 学生端拿到的题目通常没有答案
    #[serde(default)]
    pub answer_data: Value,
}

/// 按家族解码后的题目结构与答案
#[derive(Debug, Clone, PartialEq)]
pub enum TypedQuestion {
    Completion(CompletionData, BlankAnswers),
    Table(TableData, BlankAnswers),
    Matching(MatchingData, MatchingAnswers),
    Diagram(DiagramData, DiagramAnswers),
    Tfng(TfngData, TfngAnswers),
    MultipleChoice(McqData, McqAnswers),
    ShortAnswer(ShortAnswerData, ShortAnswers),
    FreeText(FreeTextAnswers),
}

impl TypedQuestion {
    pub fn family(&self) -> QuestionFamily {
        match self {
            TypedQuestion::Completion(..) => QuestionFamily::Completion,
            TypedQuestion::Table(..) => QuestionFamily::Table,
            TypedQuestion::Matching(..) => QuestionFamily::Matching,
            TypedQuestion::Diagram(..) => QuestionFamily::Diagram,
            TypedQuestion::Tfng(..) => QuestionFamily::Tfng,
            TypedQuestion::MultipleChoice(..) => QuestionFamily::MultipleChoice,
            TypedQuestion::ShortAnswer(..) => QuestionFamily::ShortAnswer,
            TypedQuestion::FreeText(..) => QuestionFamily::FreeText,
        }
    }
}

/// `null` 视为默认值，其余按结构解码
fn decode<T: DeserializeOwned + Default>(value: &Value) -> Result<T, serde_json::Error> {
    if value.is_null() {
        return Ok(T::default());
    }
    T::deserialize(value)
}

impl Question {
    pub fn family(&self) -> QuestionFamily {
        QuestionFamily::from_type(&self.question_type)
    }

    /// 解码成强类型结构
    ///
    /// 数据形态与题型不符时退化为自由文本，不会报错。
    pub fn typed(&self) -> TypedQuestion {
        match self.try_typed() {
            Ok(typed) => typed,
            Err(e) => {
                warn!(
                    "题目 {} ({}) 数据无法解码，退化为自由文本: {}",
                    self.id, self.question_type, e
                );
                TypedQuestion::FreeText(decode(&self.answer_data).unwrap_or_default())
            }
        }
    }

    fn try_typed(&self) -> Result<TypedQuestion, serde_json::Error> {
        let mut typed =
            TypedQuestion::from_parts(&self.question_type, &self.type_specific_data, &self.answer_data)?;
        if let TypedQuestion::MultipleChoice(data, _) = &mut typed {
            if data.options.is_empty() {
                data.options = self.options.clone();
            }
        }
        Ok(typed)
    }
}

impl TypedQuestion {
    /// 按题型字符串解码两段 JSON
    pub fn from_parts(question_type: &str, tsd: &Value, ans: &Value) -> Result<Self, serde_json::Error> {
        Ok(match QuestionFamily::from_type(question_type) {
            QuestionFamily::Completion => TypedQuestion::Completion(decode(tsd)?, decode(ans)?),
            QuestionFamily::Table => TypedQuestion::Table(decode(tsd)?, decode(ans)?),
            QuestionFamily::Matching => TypedQuestion::Matching(decode(tsd)?, decode(ans)?),
            QuestionFamily::Diagram => TypedQuestion::Diagram(decode(tsd)?, decode(ans)?),
            QuestionFamily::Tfng => {
                let mut data: TfngData = decode(tsd)?;
                if tsd.get("answer_type").is_none() {
                    data.answer_type = TfngMode::for_question_type(question_type);
                }
                TypedQuestion::Tfng(data, decode(ans)?)
            }
            QuestionFamily::MultipleChoice => TypedQuestion::MultipleChoice(decode(tsd)?, decode(ans)?),
            QuestionFamily::ShortAnswer => TypedQuestion::ShortAnswer(decode(tsd)?, decode(ans)?),
            QuestionFamily::FreeText => TypedQuestion::FreeText(decode(ans)?),
        })
    }
}

/// 新建题目的请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionCreate {
    pub section_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage_id: Option<i64>,
    pub question_number: u32,
    pub question_type: String,
    pub question_text: String,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub type_specific_data: Value,
    pub answer_data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(question_type: &str, tsd: Value, ans: Value) -> Question {
        Question {
            id: 7,
            section_id: Some(1),
            part_id: Some(1),
            passage_id: None,
            question_number: 1,
            question_type: question_type.to_string(),
            question_text: String::new(),
            order: 1,
            marks: None,
            instructions: None,
            image_url: None,
            options: Vec::new(),
            type_specific_data: tsd,
            answer_data: ans,
        }
    }

    #[test]
    fn decodes_completion_without_answers() {
        let q = question(
            "listening_note_completion",
            json!({"template_text": "Name: [BLANK_1]", "blanks": [{"blank_id": "BLANK_1"}]}),
            Value::Null,
        );
        match q.typed() {
            TypedQuestion::Completion(data, answers) => {
                assert_eq!(data.blanks[0].max_words, 3);
                assert!(answers.blanks.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn tfng_mode_defaults_from_type_string() {
        let q = question("reading_yes_no_not_given", json!({"statements": []}), Value::Null);
        match q.typed() {
            TypedQuestion::Tfng(data, _) => assert_eq!(data.answer_type, TfngMode::YesNoNotGiven),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mcq_falls_back_to_question_options() {
        let mut q = question("reading_multiple_choice", json!({"allow_multiple": true}), Value::Null);
        q.options = vec![ChoiceOption::new("A", "one"), ChoiceOption::new("B", "two")];
        match q.typed() {
            TypedQuestion::MultipleChoice(data, _) => {
                assert!(data.allow_multiple);
                assert_eq!(data.options.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn malformed_data_degrades_to_free_text() {
        let q = question("reading_matching_headings", json!({"items": "oops"}), Value::Null);
        assert_eq!(q.typed().family(), QuestionFamily::FreeText);
    }
}
