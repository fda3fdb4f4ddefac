use crate::models::answer::with_slot;
use crate::models::schema::TfngData;
use crate::models::AnswerValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRow {
    pub statement_number: u32,
    pub statement_text: String,
    pub selected: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfngView {
    /// 三个按钮的文字
    pub choices: [&'static str; 3],
    pub statements: Vec<StatementRow>,
}

pub fn render(data: &TfngData, answer: Option<&AnswerValue>) -> TfngView {
    TfngView {
        choices: data.answer_type.vocabulary(),
        statements: data
            .statements
            .iter()
            .map(|s| StatementRow {
                statement_number: s.statement_number,
                statement_text: s.statement_text.clone(),
                selected: answer
                    .map(|a| a.slot(&s.statement_number.to_string()))
                    .unwrap_or("")
                    .to_string(),
            })
            .collect(),
    }
}

pub fn choose(data: &TfngData, current: Option<&AnswerValue>, key: String, verdict: String) -> Result<AnswerValue, String> {
    if !data.statements.iter().any(|s| s.statement_number.to_string() == key) {
        return Err(format!("陈述 {} 不存在", key));
    }
    if !data.answer_type.accepts(&verdict) {
        return Err(format!("{} 不是可选答案", verdict));
    }
    Ok(with_slot(current, key, verdict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::{TfngMode, TfngStatement};

    fn data(mode: TfngMode) -> TfngData {
        TfngData {
            statements: vec![TfngStatement { statement_number: 1, statement_text: "The bridge opened in 1890.".into() }],
            answer_type: mode,
        }
    }

    #[test]
    fn buttons_follow_the_vocabulary() {
        assert_eq!(render(&data(TfngMode::YesNoNotGiven), None).choices, ["YES", "NO", "NOT GIVEN"]);
        let d = data(TfngMode::TrueFalseNotGiven);
        let answer = choose(&d, None, "1".into(), "NOT GIVEN".into()).unwrap();
        assert_eq!(render(&d, Some(&answer)).statements[0].selected, "NOT GIVEN");
        assert!(choose(&d, None, "1".into(), "YES".into()).is_err());
    }
}
