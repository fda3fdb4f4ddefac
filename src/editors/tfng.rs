use std::collections::BTreeMap;

use crate::editors::{check_index, EditorCommit, QuestionEditor};
use crate::error::EditorError;
use crate::models::schema::{TfngAnswers, TfngData, TfngMode, TfngStatement};

/// 判断题（TRUE/FALSE/NOT GIVEN 或 YES/NO/NOT GIVEN）编辑器
#[derive(Debug, Clone)]
pub struct TfngEditor {
    statements: Vec<TfngStatement>,
    mode: TfngMode,
    answers: BTreeMap<u32, String>,
}

impl TfngEditor {
    /// 词表由题型字符串决定默认值
    pub fn new(question_type: &str) -> Self {
        Self {
            statements: vec![TfngStatement {
                statement_number: 1,
                statement_text: String::new(),
            }],
            mode: TfngMode::for_question_type(question_type),
            answers: BTreeMap::new(),
        }
    }

    pub fn statements(&self) -> &[TfngStatement] {
        &self.statements
    }

    pub fn answer_type(&self) -> TfngMode {
        self.mode
    }

    pub fn answer(&self, statement_number: u32) -> Option<&str> {
        self.answers.get(&statement_number).map(String::as_str)
    }

    pub fn add_statement(&mut self) {
        self.statements.push(TfngStatement {
            statement_number: self.statements.len() as u32 + 1,
            statement_text: String::new(),
        });
    }

    /// 删除陈述，其余陈述重新编号，答案跟随迁移
    pub fn remove_statement(&mut self, index: usize) -> Result<(), EditorError> {
        check_index(index, self.statements.len())?;
        if self.statements.len() <= 1 {
            return Err(EditorError::MinimumReached { min: 1 });
        }
        let removed = self.statements.remove(index);
        self.answers.remove(&removed.statement_number);
        self.renumber_statements();
        Ok(())
    }

    /// 陈述按当前顺序编号为 1..n，答案跟随迁移
    fn renumber_statements(&mut self) {
        let old = std::mem::take(&mut self.answers);
        for (pos, statement) in self.statements.iter_mut().enumerate() {
            let new_number = pos as u32 + 1;
            if let Some(verdict) = old.get(&statement.statement_number) {
                self.answers.insert(new_number, verdict.clone());
            }
            statement.statement_number = new_number;
        }
    }

    pub fn set_statement_text(&mut self, index: usize, text: impl Into<String>) -> Result<(), EditorError> {
        check_index(index, self.statements.len())?;
        self.statements[index].statement_text = text.into();
        Ok(())
    }

    /// 切换词表，已有答案换算到新词表
    pub fn set_answer_type(&mut self, mode: TfngMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        for verdict in self.answers.values_mut() {
            if let Some(translated) = mode.translate(verdict) {
                *verdict = translated.to_string();
            }
        }
    }

    pub fn set_answer(&mut self, statement_number: u32, verdict: &str) -> Result<(), EditorError> {
        if !self.statements.iter().any(|s| s.statement_number == statement_number) {
            return Err(EditorError::UnknownStatement(statement_number));
        }
        let verdict = verdict.trim().to_uppercase();
        if !self.mode.accepts(&verdict) {
            return Err(EditorError::InvalidVerdict(verdict));
        }
        self.answers.insert(statement_number, verdict);
        Ok(())
    }
}

impl QuestionEditor for TfngEditor {
    fn commit(&self) -> serde_json::Result<EditorCommit> {
        let data = TfngData {
            statements: self.statements.clone(),
            answer_type: self.mode,
        };
        let answers = self
            .statements
            .iter()
            .filter_map(|s| {
                self.answers
                    .get(&s.statement_number)
                    .map(|v| (s.statement_number, v.clone()))
            })
            .collect();
        EditorCommit::from_parts(&data, &TfngAnswers { answers })
    }

    fn load(&mut self, commit: &EditorCommit) -> serde_json::Result<()> {
        let (data, answers): (TfngData, TfngAnswers) = commit.to_parts()?;
        self.statements = data.statements;
        self.mode = data.answer_type;
        self.answers = answers.answers;
        self.renumber_statements();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vocabulary_defaults_from_question_type() {
        assert_eq!(TfngEditor::new("reading_yes_no_not_given").answer_type(), TfngMode::YesNoNotGiven);
        assert_eq!(
            TfngEditor::new("reading_true_false_not_given").answer_type(),
            TfngMode::TrueFalseNotGiven
        );
    }

    #[test]
    fn verdicts_outside_the_vocabulary_are_refused() {
        let mut editor = TfngEditor::new("reading_true_false_not_given");
        editor.set_answer(1, "not given").unwrap();
        assert_eq!(editor.answer(1), Some("NOT GIVEN"));
        assert_eq!(editor.set_answer(1, "YES"), Err(EditorError::InvalidVerdict("YES".into())));
        assert_eq!(editor.set_answer(9, "TRUE"), Err(EditorError::UnknownStatement(9)));
    }

    #[test]
    fn switching_vocabulary_translates_answers() {
        let mut editor = TfngEditor::new("reading_true_false_not_given");
        editor.add_statement();
        editor.add_statement();
        editor.set_answer(1, "TRUE").unwrap();
        editor.set_answer(2, "FALSE").unwrap();
        editor.set_answer(3, "NOT GIVEN").unwrap();

        editor.set_answer_type(TfngMode::YesNoNotGiven);
        assert_eq!(editor.answer(1), Some("YES"));
        assert_eq!(editor.answer(2), Some("NO"));
        assert_eq!(editor.answer(3), Some("NOT GIVEN"));
    }

    #[test]
    fn loading_gapped_statements_renumbers_them() {
        let commit = EditorCommit {
            type_specific_data: json!({
                "statements": [
                    {"statement_number": 3, "statement_text": "a"},
                    {"statement_number": 7, "statement_text": "b"}
                ],
                "answer_type": "true_false_not_given"
            }),
            answer_data: json!({"answers": {"7": "FALSE"}}),
        };
        let mut editor = TfngEditor::new("reading_true_false_not_given");
        editor.load(&commit).unwrap();
        assert_eq!(editor.answer(2), Some("FALSE"));
        assert_eq!(editor.answer(1), None);

        editor.add_statement();
        let numbers: Vec<_> = editor.statements().iter().map(|s| s.statement_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn removing_a_statement_renumbers_and_moves_answers() {
        let mut editor = TfngEditor::new("reading_true_false_not_given");
        editor.add_statement();
        editor.add_statement();
        editor.set_answer(1, "TRUE").unwrap();
        editor.set_answer(3, "FALSE").unwrap();
        editor.remove_statement(0).unwrap();

        let commit = editor.commit().unwrap();
        assert_eq!(commit.answer_data, json!({"answers": {"2": "FALSE"}}));
        assert_eq!(commit.type_specific_data["answer_type"], "true_false_not_given");
        assert_eq!(commit.type_specific_data["statements"][1]["statement_number"], 2);
    }
}
