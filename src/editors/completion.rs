use crate::editors::blanks::{detect_blank_ids, BlankSet};
use crate::editors::{EditorCommit, QuestionEditor};
use crate::error::EditorError;
use crate::models::schema::{BlankAnswers, BlankConfig, CompletionData};

/// 填空题编辑器
///
/// 模板文本中的 `[BLANK_N]` 每次修改后重新扫描，空位配置随之同步。
#[derive(Debug, Clone, Default)]
pub struct CompletionEditor {
    template_text: String,
    blanks: BlankSet,
}

impl CompletionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template_text(&self) -> &str {
        &self.template_text
    }

    pub fn blanks(&self) -> &[BlankConfig] {
        self.blanks.blanks()
    }

    pub fn answers(&self, blank_id: &str) -> &[String] {
        self.blanks.answers(blank_id)
    }

    /// 更新模板文本并同步空位
    pub fn set_template_text(&mut self, text: impl Into<String>) {
        self.template_text = text.into();
        let ids = detect_blank_ids(&self.template_text);
        self.blanks.sync(&ids);
    }

    pub fn set_max_words(&mut self, blank_id: &str, max_words: u8) -> Result<(), EditorError> {
        self.blanks.set_max_words(blank_id, max_words)
    }

    pub fn set_case_sensitive(&mut self, blank_id: &str, case_sensitive: bool) -> Result<(), EditorError> {
        self.blanks.set_case_sensitive(blank_id, case_sensitive)
    }

    pub fn add_answer(&mut self, blank_id: &str, text: &str) -> Result<(), EditorError> {
        self.blanks.add_answer(blank_id, text)
    }

    pub fn remove_answer(&mut self, blank_id: &str, index: usize) -> Result<(), EditorError> {
        self.blanks.remove_answer(blank_id, index)
    }
}

impl QuestionEditor for CompletionEditor {
    fn commit(&self) -> serde_json::Result<EditorCommit> {
        let data = CompletionData {
            template_text: self.template_text.clone(),
            blanks: self.blanks.blanks().to_vec(),
        };
        EditorCommit::from_parts(&data, &self.blanks.committed_answers())
    }

    fn load(&mut self, commit: &EditorCommit) -> serde_json::Result<()> {
        let (data, answers): (CompletionData, BlankAnswers) = commit.to_parts()?;
        self.template_text = data.template_text;
        self.blanks = BlankSet::from_parts(data.blanks, answers);
        // 旧数据可能与模板不一致，按模板重新对齐
        let ids = detect_blank_ids(&self.template_text);
        self.blanks.sync(&ids);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn n_distinct_markers_give_n_default_configs() {
        let mut editor = CompletionEditor::new();
        editor.set_template_text("[BLANK_3] a [BLANK_1] b [BLANK_3] c [BLANK_2]");
        let ids: Vec<_> = editor.blanks().iter().map(|b| b.blank_id.as_str()).collect();
        assert_eq!(ids, vec!["BLANK_3", "BLANK_1", "BLANK_2"]);
        assert!(editor.blanks().iter().all(|b| b.max_words == 3 && !b.case_sensitive));
    }

    #[test]
    fn typing_keeps_configured_blanks_and_drops_removed_ones() {
        let mut editor = CompletionEditor::new();
        editor.set_template_text("Name: [BLANK_1], Street: [BLANK_2]");
        editor.set_max_words("BLANK_1", 1).unwrap();
        editor.set_case_sensitive("BLANK_1", true).unwrap();

        editor.set_template_text("Name: [BLANK_1], Town: [BLANK_4]");
        let blanks = editor.blanks();
        assert_eq!(blanks.len(), 2);
        assert_eq!(blanks[0].max_words, 1);
        assert!(blanks[0].case_sensitive);
        assert_eq!(blanks[1], BlankConfig::with_defaults("BLANK_4"));
    }

    #[test]
    fn commit_emits_both_blobs_with_aligned_keys() {
        let mut editor = CompletionEditor::new();
        editor.set_template_text("The [BLANK_1] is near the [BLANK_2].");
        editor.add_answer("BLANK_1", "library").unwrap();
        editor.add_answer("BLANK_1", "the library").unwrap();

        let commit = editor.commit().unwrap();
        assert_eq!(
            commit.type_specific_data,
            json!({
                "template_text": "The [BLANK_1] is near the [BLANK_2].",
                "blanks": [
                    {"blank_id": "BLANK_1", "max_words": 3, "case_sensitive": false},
                    {"blank_id": "BLANK_2", "max_words": 3, "case_sensitive": false}
                ]
            })
        );
        assert_eq!(
            commit.answer_data,
            json!({"blanks": {"BLANK_1": ["library", "the library"], "BLANK_2": []}})
        );
    }

    #[test]
    fn load_replaces_the_draft_explicitly() {
        let mut editor = CompletionEditor::new();
        editor.set_template_text("draft [BLANK_1]");
        let external = EditorCommit {
            type_specific_data: json!({"template_text": "[BLANK_5] only", "blanks": [{"blank_id": "BLANK_5", "max_words": 2}]}),
            answer_data: json!({"blanks": {"BLANK_5": ["x"]}}),
        };
        editor.load(&external).unwrap();
        assert_eq!(editor.template_text(), "[BLANK_5] only");
        assert_eq!(editor.blanks()[0].max_words, 2);
        assert_eq!(editor.answers("BLANK_5"), ["x"]);
    }
}
