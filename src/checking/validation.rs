//! 保存前的题目数据校验

use crate::editors::blanks::{collect_blank_ids, detect_blank_ids};
use crate::editors::EditorCommit;
use crate::error::ValidationError;
use crate::models::schema::*;
use crate::models::TypedQuestion;

fn require_answers<'a>(
    ids: impl IntoIterator<Item = &'a String>,
    answers: &std::collections::BTreeMap<String, Vec<String>>,
    missing: impl Fn(String) -> ValidationError,
) -> Result<(), ValidationError> {
    for id in ids {
        let answered = answers
            .get(id)
            .map(|list| list.iter().any(|a| !a.trim().is_empty()))
            .unwrap_or(false);
        if !answered {
            return Err(missing(id.clone()));
        }
    }
    Ok(())
}

fn validate_completion(data: &CompletionData, answers: &BlankAnswers) -> Result<(), ValidationError> {
    if data.template_text.trim().is_empty() {
        return Err(ValidationError::MissingTemplate);
    }
    let ids = detect_blank_ids(&data.template_text);
    if ids.is_empty() {
        return Err(ValidationError::NoBlanks);
    }
    require_answers(&ids, &answers.blanks, ValidationError::MissingBlankAnswer)
}

fn validate_table(data: &TableData, answers: &BlankAnswers) -> Result<(), ValidationError> {
    let rows = &data.table_structure.rows;
    if rows.is_empty() || rows.iter().flatten().all(|c| c.trim().is_empty()) {
        return Err(ValidationError::MissingTemplate);
    }
    let mut ids = Vec::new();
    for cell in rows.iter().flatten() {
        collect_blank_ids(cell, &mut ids);
    }
    if ids.is_empty() {
        return Err(ValidationError::NoBlanks);
    }
    require_answers(&ids, &answers.blanks, ValidationError::MissingBlankAnswer)
}

fn validate_matching(data: &MatchingData, answers: &MatchingAnswers) -> Result<(), ValidationError> {
    if data.items.is_empty() || data.options.is_empty() {
        return Err(ValidationError::MatchingIncomplete);
    }
    if !data.allow_option_reuse && data.options.len() < data.items.len() {
        return Err(ValidationError::NotEnoughOptions {
            items: data.items.len(),
            options: data.options.len(),
        });
    }
    for item in &data.items {
        let label = answers
            .mappings
            .get(&item.item_number)
            .ok_or(ValidationError::MissingMapping(item.item_number))?;
        if !data.options.iter().any(|o| o.option_label.eq_ignore_ascii_case(label)) {
            return Err(ValidationError::InvalidMapping {
                item: item.item_number,
                label: label.clone(),
            });
        }
    }
    Ok(())
}

fn validate_mcq(data: &McqData, answers: &McqAnswers) -> Result<(), ValidationError> {
    if data.options.len() < 2 {
        return Err(ValidationError::TooFewChoices);
    }
    let correct = &answers.correct_options;
    if correct.is_empty() {
        return Err(ValidationError::NoCorrectOption);
    }
    if !data.allow_multiple && correct.len() != 1 {
        return Err(ValidationError::SingleSelectAnswerCount(correct.len()));
    }
    if let Some(bad) = correct
        .iter()
        .find(|c| !data.options.iter().any(|o| o.option_label.eq_ignore_ascii_case(c)))
    {
        return Err(ValidationError::InvalidCorrectOption(bad.clone()));
    }
    Ok(())
}

fn validate_diagram(data: &DiagramData, answers: &DiagramAnswers) -> Result<(), ValidationError> {
    if data.image_url.trim().is_empty() {
        return Err(ValidationError::MissingImage);
    }
    if data.labels.is_empty() {
        return Err(ValidationError::NoLabels);
    }
    require_answers(
        data.labels.iter().map(|l| &l.label_id),
        &answers.labels,
        ValidationError::MissingLabelAnswer,
    )
}

fn validate_tfng(data: &TfngData, answers: &TfngAnswers) -> Result<(), ValidationError> {
    if data.statements.is_empty() {
        return Err(ValidationError::NoStatements);
    }
    for statement in &data.statements {
        let number = statement.statement_number;
        let answer = answers
            .answers
            .get(&number)
            .ok_or(ValidationError::MissingStatementAnswer(number))?;
        if !data.answer_type.accepts(&answer.trim().to_uppercase()) {
            return Err(ValidationError::InvalidStatementAnswer {
                number,
                answer: answer.clone(),
            });
        }
    }
    Ok(())
}

/// 校验已解码的题目
pub fn validate_typed(typed: &TypedQuestion) -> Result<(), ValidationError> {
    match typed {
        TypedQuestion::Completion(d, a) => validate_completion(d, a),
        TypedQuestion::Table(d, a) => validate_table(d, a),
        TypedQuestion::Matching(d, a) => validate_matching(d, a),
        TypedQuestion::MultipleChoice(d, a) => validate_mcq(d, a),
        TypedQuestion::Diagram(d, a) => validate_diagram(d, a),
        TypedQuestion::Tfng(d, a) => validate_tfng(d, a),
        TypedQuestion::ShortAnswer(_, a) => {
            if a.correct_answers.iter().all(|s| s.trim().is_empty()) {
                return Err(ValidationError::MissingShortAnswer);
            }
            Ok(())
        }
        TypedQuestion::FreeText(a) => {
            if a.correct_answer.trim().is_empty() {
                return Err(ValidationError::MissingShortAnswer);
            }
            Ok(())
        }
    }
}

/// 校验编辑器提交的数据；无法解码时视为缺少模板
pub fn validate_commit(question_type: &str, commit: &EditorCommit) -> Result<(), ValidationError> {
    let typed = TypedQuestion::from_parts(question_type, &commit.type_specific_data, &commit.answer_data)
        .map_err(|_| ValidationError::MissingTemplate)?;
    validate_typed(&typed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editors::{CompletionEditor, DiagramEditor, MatchingEditor, McqEditor, QuestionEditor, TfngEditor};

    #[test]
    fn completion_requires_every_blank_answered() {
        let mut editor = CompletionEditor::new();
        assert_eq!(
            validate_commit("listening_form_completion", &editor.commit().unwrap()),
            Err(ValidationError::MissingTemplate)
        );
        editor.set_template_text("no blanks here");
        assert_eq!(
            validate_commit("listening_form_completion", &editor.commit().unwrap()),
            Err(ValidationError::NoBlanks)
        );
        editor.set_template_text("[BLANK_1] and [BLANK_2]");
        editor.add_answer("BLANK_1", "bread").unwrap();
        assert_eq!(
            validate_commit("listening_form_completion", &editor.commit().unwrap()),
            Err(ValidationError::MissingBlankAnswer("BLANK_2".into()))
        );
        editor.add_answer("BLANK_2", "milk").unwrap();
        assert!(validate_commit("listening_form_completion", &editor.commit().unwrap()).is_ok());
    }

    #[test]
    fn matching_needs_enough_options_and_mappings() {
        let mut editor = MatchingEditor::new();
        for _ in 0..3 {
            editor.add_item();
        }
        assert_eq!(
            validate_commit("reading_matching_features", &editor.commit().unwrap()),
            Err(ValidationError::NotEnoughOptions { items: 4, options: 3 })
        );
        editor.add_option().unwrap();
        editor.set_mapping(1, "A").unwrap();
        assert_eq!(
            validate_commit("reading_matching_features", &editor.commit().unwrap()),
            Err(ValidationError::MissingMapping(2))
        );
    }

    #[test]
    fn single_select_needs_exactly_one_answer() {
        let mut editor = McqEditor::new();
        assert_eq!(
            validate_commit("reading_multiple_choice", &editor.commit().unwrap()),
            Err(ValidationError::NoCorrectOption)
        );
        editor.toggle_correct("B").unwrap();
        assert!(validate_commit("reading_multiple_choice", &editor.commit().unwrap()).is_ok());

        let bad = EditorCommit {
            type_specific_data: serde_json::json!({"options": [{"option_label": "A"}, {"option_label": "B"}]}),
            answer_data: serde_json::json!({"correct_options": ["A", "B"]}),
        };
        assert_eq!(
            validate_commit("reading_multiple_choice", &bad),
            Err(ValidationError::SingleSelectAnswerCount(2))
        );
    }

    #[test]
    fn diagram_needs_image_labels_and_answers() {
        let mut editor = DiagramEditor::new();
        assert_eq!(
            validate_commit("listening_map_labeling", &editor.commit().unwrap()),
            Err(ValidationError::MissingImage)
        );
        editor.set_image_url("/uploads/images/a.png");
        assert_eq!(
            validate_commit("listening_map_labeling", &editor.commit().unwrap()),
            Err(ValidationError::NoLabels)
        );
        editor.place_label(5.0, 5.0, 10.0, 10.0).unwrap();
        assert_eq!(
            validate_commit("listening_map_labeling", &editor.commit().unwrap()),
            Err(ValidationError::MissingLabelAnswer("1".into()))
        );
    }

    #[test]
    fn tfng_answers_must_come_from_the_vocabulary() {
        let mut editor = TfngEditor::new("reading_yes_no_not_given");
        assert_eq!(
            validate_commit("reading_yes_no_not_given", &editor.commit().unwrap()),
            Err(ValidationError::MissingStatementAnswer(1))
        );
        editor.set_answer(1, "yes").unwrap();
        assert!(validate_commit("reading_yes_no_not_given", &editor.commit().unwrap()).is_ok());

        let mismatched = EditorCommit {
            type_specific_data: serde_json::json!({"statements": [{"statement_number": 1}], "answer_type": "yes_no_not_given"}),
            answer_data: serde_json::json!({"answers": {"1": "TRUE"}}),
        };
        assert_eq!(
            validate_commit("reading_yes_no_not_given", &mismatched),
            Err(ValidationError::InvalidStatementAnswer { number: 1, answer: "TRUE".into() })
        );
    }
}
