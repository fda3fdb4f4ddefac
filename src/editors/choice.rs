use crate::editors::{check_index, option_label, push_answer, remove_answer_at, EditorCommit, QuestionEditor, MAX_OPTIONS};
use crate::error::EditorError;
use crate::models::schema::{ChoiceOption, McqAnswers, McqData, ShortAnswerData, ShortAnswers, WORD_LIMIT_RANGE};

const MIN_CHOICES: usize = 2;
const DEFAULT_CHOICES: usize = 4;

/// 选择题编辑器
///
/// 选项字母始终按 A.. 连续编号；单选时正确答案只有一个。
#[derive(Debug, Clone)]
pub struct McqEditor {
    options: Vec<ChoiceOption>,
    allow_multiple: bool,
    correct: Vec<String>,
}

impl Default for McqEditor {
    fn default() -> Self {
        Self {
            options: (0..DEFAULT_CHOICES).map(|i| ChoiceOption::new(option_label(i), "")).collect(),
            allow_multiple: false,
            correct: Vec::new(),
        }
    }
}

impl McqEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn allow_multiple(&self) -> bool {
        self.allow_multiple
    }

    pub fn correct_options(&self) -> &[String] {
        &self.correct
    }

    pub fn add_option(&mut self) -> Result<(), EditorError> {
        if self.options.len() >= MAX_OPTIONS {
            return Err(EditorError::TooManyOptions { max: MAX_OPTIONS });
        }
        self.options.push(ChoiceOption::new(option_label(self.options.len()), ""));
        Ok(())
    }

    /// 删除选项并重新编号，正确答案随之改名
    pub fn remove_option(&mut self, index: usize) -> Result<(), EditorError> {
        check_index(index, self.options.len())?;
        if self.options.len() <= MIN_CHOICES {
            return Err(EditorError::MinimumReached { min: MIN_CHOICES });
        }
        let removed = self.options.remove(index);
        self.correct.retain(|l| *l != removed.option_label);

        let mut renamed = Vec::with_capacity(self.options.len());
        for (pos, option) in self.options.iter_mut().enumerate() {
            let new_label = option_label(pos);
            renamed.push((std::mem::replace(&mut option.option_label, new_label.clone()), new_label));
        }
        for label in &mut self.correct {
            if let Some((_, new_label)) = renamed.iter().find(|(old, _)| old.as_str() == label.as_str()) {
                *label = new_label.clone();
            }
        }
        self.correct.sort();
        Ok(())
    }

    pub fn set_option_text(&mut self, index: usize, text: impl Into<String>) -> Result<(), EditorError> {
        check_index(index, self.options.len())?;
        self.options[index].option_text = text.into();
        Ok(())
    }

    /// 切换单选/多选时清空正确答案
    pub fn set_allow_multiple(&mut self, allow: bool) {
        if self.allow_multiple != allow {
            self.allow_multiple = allow;
            self.correct.clear();
        }
    }

    /// 标记/取消正确答案；单选时直接替换
    pub fn toggle_correct(&mut self, label: &str) -> Result<(), EditorError> {
        if !self.options.iter().any(|o| o.option_label == label) {
            return Err(EditorError::UnknownOption(label.to_string()));
        }
        if !self.allow_multiple {
            self.correct = vec![label.to_string()];
        } else if let Some(pos) = self.correct.iter().position(|l| l == label) {
            self.correct.remove(pos);
        } else {
            self.correct.push(label.to_string());
            self.correct.sort();
        }
        Ok(())
    }
}

impl QuestionEditor for McqEditor {
    fn commit(&self) -> serde_json::Result<EditorCommit> {
        let data = McqData {
            options: self.options.clone(),
            allow_multiple: self.allow_multiple,
        };
        EditorCommit::from_parts(&data, &McqAnswers { correct_options: self.correct.clone() })
    }

    fn load(&mut self, commit: &EditorCommit) -> serde_json::Result<()> {
        let (data, answers): (McqData, McqAnswers) = commit.to_parts()?;
        self.options = data.options;
        self.allow_multiple = data.allow_multiple;
        self.correct = answers.correct_options;
        Ok(())
    }
}

/// 简答题编辑器
#[derive(Debug, Clone, Default)]
pub struct ShortAnswerEditor {
    data: ShortAnswerData,
    answers: Vec<String>,
}

impl ShortAnswerEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_words(&self) -> u8 {
        self.data.max_words
    }

    pub fn case_sensitive(&self) -> bool {
        self.data.case_sensitive
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn set_max_words(&mut self, max_words: u8) -> Result<(), EditorError> {
        if !WORD_LIMIT_RANGE.contains(&max_words) {
            return Err(EditorError::WordLimitOutOfRange(max_words));
        }
        self.data.max_words = max_words;
        Ok(())
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.data.case_sensitive = case_sensitive;
    }

    /// 答案可用括号标出可省略的词，如 `(fast) food`
    pub fn add_answer(&mut self, text: &str) -> Result<(), EditorError> {
        push_answer(&mut self.answers, text)
    }

    pub fn remove_answer(&mut self, index: usize) -> Result<(), EditorError> {
        remove_answer_at(&mut self.answers, index)
    }
}

impl QuestionEditor for ShortAnswerEditor {
    fn commit(&self) -> serde_json::Result<EditorCommit> {
        EditorCommit::from_parts(&self.data, &ShortAnswers { correct_answers: self.answers.clone() })
    }

    fn load(&mut self, commit: &EditorCommit) -> serde_json::Result<()> {
        let (data, answers): (ShortAnswerData, ShortAnswers) = commit.to_parts()?;
        self.data = data;
        self.answers = answers.correct_answers;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_select_replaces_the_correct_option() {
        let mut editor = McqEditor::new();
        editor.toggle_correct("A").unwrap();
        editor.toggle_correct("C").unwrap();
        assert_eq!(editor.correct_options(), ["C"]);
        assert_eq!(editor.toggle_correct("Q"), Err(EditorError::UnknownOption("Q".into())));
    }

    #[test]
    fn multi_select_toggles_and_keeps_labels_sorted() {
        let mut editor = McqEditor::new();
        editor.set_allow_multiple(true);
        editor.toggle_correct("D").unwrap();
        editor.toggle_correct("B").unwrap();
        editor.toggle_correct("A").unwrap();
        editor.toggle_correct("D").unwrap();
        assert_eq!(editor.correct_options(), ["A", "B"]);
    }

    #[test]
    fn removing_an_option_relabels_correct_answers() {
        let mut editor = McqEditor::new();
        editor.set_allow_multiple(true);
        editor.toggle_correct("B").unwrap();
        editor.toggle_correct("D").unwrap();
        editor.remove_option(1).unwrap();
        let labels: Vec<_> = editor.options().iter().map(|o| o.option_label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert_eq!(editor.correct_options(), ["C"]);
    }

    #[test]
    fn keeps_at_least_two_options() {
        let mut editor = McqEditor::new();
        editor.remove_option(0).unwrap();
        editor.remove_option(0).unwrap();
        assert_eq!(editor.remove_option(0), Err(EditorError::MinimumReached { min: 2 }));
    }

    #[test]
    fn mcq_commit_shape() {
        let mut editor = McqEditor::new();
        editor.set_option_text(0, "a museum").unwrap();
        editor.toggle_correct("A").unwrap();
        let commit = editor.commit().unwrap();
        assert_eq!(commit.answer_data, json!({"correct_options": ["A"]}));
        assert_eq!(commit.type_specific_data["options"][0]["option_text"], "a museum");
        assert_eq!(commit.type_specific_data["allow_multiple"], false);
    }

    #[test]
    fn short_answer_defaults_and_commit() {
        let mut editor = ShortAnswerEditor::new();
        assert_eq!(editor.max_words(), 3);
        editor.add_answer("(fast) food").unwrap();
        editor.set_max_words(2).unwrap();
        let commit = editor.commit().unwrap();
        assert_eq!(commit.type_specific_data, json!({"max_words": 2, "case_sensitive": false}));
        assert_eq!(commit.answer_data, json!({"correct_answers": ["(fast) food"]}));
    }
}
