use std::collections::BTreeMap;

use crate::editors::{check_index, option_label, EditorCommit, QuestionEditor, MAX_OPTIONS};
use crate::error::EditorError;
use crate::models::schema::{ChoiceOption, MatchingAnswers, MatchingData, MatchingItem};

/// 匹配题删除选项时至少保留的数量
const MIN_OPTIONS: usize = 2;

/// 下拉框中的一个选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionChoice {
    pub label: String,
    pub text: String,
    pub disabled: bool,
}

/// 匹配题编辑器
///
/// 题目按 1..n 编号，选项按 A.. 编号；任何增删之后两者都重新连续编号，
/// 答案映射随之改键/改值。
#[derive(Debug, Clone)]
pub struct MatchingEditor {
    items: Vec<MatchingItem>,
    options: Vec<ChoiceOption>,
    allow_option_reuse: bool,
    mappings: BTreeMap<u32, String>,
}

impl Default for MatchingEditor {
    fn default() -> Self {
        Self {
            items: vec![MatchingItem {
                item_number: 1,
                item_text: String::new(),
            }],
            options: (0..3).map(|i| ChoiceOption::new(option_label(i), "")).collect(),
            allow_option_reuse: false,
            mappings: BTreeMap::new(),
        }
    }
}

impl MatchingEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[MatchingItem] {
        &self.items
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn mappings(&self) -> &BTreeMap<u32, String> {
        &self.mappings
    }

    pub fn allow_option_reuse(&self) -> bool {
        self.allow_option_reuse
    }

    pub fn add_item(&mut self) {
        self.items.push(MatchingItem {
            item_number: self.items.len() as u32 + 1,
            item_text: String::new(),
        });
    }

    /// 删除题目：移除它的答案，其余题目重新编号并迁移答案
    pub fn remove_item(&mut self, index: usize) -> Result<(), EditorError> {
        check_index(index, self.items.len())?;
        if self.items.len() <= 1 {
            return Err(EditorError::MinimumReached { min: 1 });
        }
        let removed = self.items.remove(index);
        self.mappings.remove(&removed.item_number);
        self.renumber_items();
        Ok(())
    }

    /// 题目按当前顺序编号为 1..n，答案跟随迁移，指向不存在题目的答案丢弃
    fn renumber_items(&mut self) {
        let old = std::mem::take(&mut self.mappings);
        for (pos, item) in self.items.iter_mut().enumerate() {
            let new_number = pos as u32 + 1;
            if let Some(label) = old.get(&item.item_number) {
                self.mappings.insert(new_number, label.clone());
            }
            item.item_number = new_number;
        }
    }

    /// 选项按当前顺序编号为 A..，答案随之改标签，指向不存在选项的答案丢弃
    fn relabel_options(&mut self) {
        let mut relabel = BTreeMap::new();
        for (pos, option) in self.options.iter_mut().enumerate() {
            let new_label = option_label(pos);
            relabel.insert(std::mem::replace(&mut option.option_label, new_label.clone()), new_label);
        }
        self.mappings = std::mem::take(&mut self.mappings)
            .into_iter()
            .filter_map(|(number, label)| relabel.get(&label).map(|l| (number, l.clone())))
            .collect();
    }

    pub fn set_item_text(&mut self, index: usize, text: impl Into<String>) -> Result<(), EditorError> {
        check_index(index, self.items.len())?;
        self.items[index].item_text = text.into();
        Ok(())
    }

    pub fn add_option(&mut self) -> Result<(), EditorError> {
        if self.options.len() >= MAX_OPTIONS {
            return Err(EditorError::TooManyOptions { max: MAX_OPTIONS });
        }
        self.options.push(ChoiceOption::new(option_label(self.options.len()), ""));
        Ok(())
    }

    /// 删除选项：指向它的答案被清除，其余选项重新编号并迁移答案
    pub fn remove_option(&mut self, index: usize) -> Result<(), EditorError> {
        check_index(index, self.options.len())?;
        if self.options.len() <= MIN_OPTIONS {
            return Err(EditorError::MinimumReached { min: MIN_OPTIONS });
        }
        let removed = self.options.remove(index);
        self.mappings.retain(|_, label| *label != removed.option_label);
        self.relabel_options();
        Ok(())
    }

    pub fn set_option_text(&mut self, index: usize, text: impl Into<String>) -> Result<(), EditorError> {
        check_index(index, self.options.len())?;
        self.options[index].option_text = text.into();
        Ok(())
    }

    /// 切换是否允许选项复用
    ///
    /// 关闭复用时，同一选项只保留编号最小的题目的映射。
    pub fn set_allow_option_reuse(&mut self, allow: bool) {
        self.allow_option_reuse = allow;
        if !allow {
            let mut seen = Vec::new();
            self.mappings.retain(|_, label| {
                if seen.contains(label) {
                    false
                } else {
                    seen.push(label.clone());
                    true
                }
            });
        }
    }

    /// 选项少于题目且不允许复用时需要提示作者
    pub fn needs_more_options(&self) -> bool {
        !self.allow_option_reuse && self.options.len() < self.items.len()
    }

    pub fn set_mapping(&mut self, item_number: u32, label: &str) -> Result<(), EditorError> {
        if !self.items.iter().any(|i| i.item_number == item_number) {
            return Err(EditorError::UnknownItem(item_number));
        }
        if !self.options.iter().any(|o| o.option_label == label) {
            return Err(EditorError::UnknownOption(label.to_string()));
        }
        if !self.allow_option_reuse {
            if let Some((other, _)) = self
                .mappings
                .iter()
                .find(|(n, l)| **n != item_number && l.as_str() == label)
            {
                return Err(EditorError::OptionAlreadyUsed {
                    label: label.to_string(),
                    item: *other,
                });
            }
        }
        self.mappings.insert(item_number, label.to_string());
        Ok(())
    }

    pub fn clear_mapping(&mut self, item_number: u32) {
        self.mappings.remove(&item_number);
    }

    /// 某道题下拉框的选项状态
    pub fn option_choices(&self, item_number: u32) -> Vec<OptionChoice> {
        self.options
            .iter()
            .map(|o| {
                let used_elsewhere = self
                    .mappings
                    .iter()
                    .any(|(n, l)| *n != item_number && *l == o.option_label);
                OptionChoice {
                    label: o.option_label.clone(),
                    text: o.option_text.clone(),
                    disabled: used_elsewhere && !self.allow_option_reuse,
                }
            })
            .collect()
    }
}

impl QuestionEditor for MatchingEditor {
    fn commit(&self) -> serde_json::Result<EditorCommit> {
        let data = MatchingData {
            items: self.items.clone(),
            options: self.options.clone(),
            allow_option_reuse: self.allow_option_reuse,
        };
        EditorCommit::from_parts(&data, &MatchingAnswers { mappings: self.mappings.clone() })
    }

    fn load(&mut self, commit: &EditorCommit) -> serde_json::Result<()> {
        let (data, answers): (MatchingData, MatchingAnswers) = commit.to_parts()?;
        self.items = data.items;
        self.options = data.options;
        self.allow_option_reuse = data.allow_option_reuse;
        self.mappings = answers.mappings;
        self.renumber_items();
        self.relabel_options();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(editor: &MatchingEditor) -> Vec<String> {
        editor.options().iter().map(|o| o.option_label.clone()).collect()
    }

    fn editor_with_three_items() -> MatchingEditor {
        let mut editor = MatchingEditor::new();
        editor.add_item();
        editor.add_item();
        editor.set_mapping(1, "A").unwrap();
        editor.set_mapping(2, "B").unwrap();
        editor.set_mapping(3, "C").unwrap();
        editor
    }

    #[test]
    fn defaults_to_one_item_and_three_options() {
        let editor = MatchingEditor::new();
        assert_eq!(editor.items().len(), 1);
        assert_eq!(labels(&editor), vec!["A", "B", "C"]);
    }

    #[test]
    fn removing_an_item_renumbers_and_drops_its_mapping() {
        let mut editor = editor_with_three_items();
        editor.remove_item(0).unwrap();
        let numbers: Vec<_> = editor.items().iter().map(|i| i.item_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        // 原 2、3 题的答案跟随题目迁移，原 1 题的答案 A 已不存在
        assert_eq!(editor.mappings().get(&1).map(String::as_str), Some("B"));
        assert_eq!(editor.mappings().get(&2).map(String::as_str), Some("C"));
        assert!(!editor.mappings().values().any(|l| l == "A"));
    }

    #[test]
    fn removing_the_last_remaining_item_is_refused() {
        let mut editor = MatchingEditor::new();
        assert_eq!(editor.remove_item(0), Err(EditorError::MinimumReached { min: 1 }));
    }

    #[test]
    fn option_labels_stay_contiguous() {
        let mut editor = MatchingEditor::new();
        editor.add_option().unwrap();
        editor.add_option().unwrap();
        assert_eq!(labels(&editor), vec!["A", "B", "C", "D", "E"]);
        editor.remove_option(1).unwrap();
        assert_eq!(labels(&editor), vec!["A", "B", "C", "D"]);
        editor.remove_option(0).unwrap();
        editor.remove_option(0).unwrap();
        assert_eq!(labels(&editor), vec!["A", "B"]);
        assert_eq!(editor.remove_option(0), Err(EditorError::MinimumReached { min: 2 }));
    }

    #[test]
    fn removing_an_option_relabels_mappings() {
        let mut editor = editor_with_three_items();
        editor.remove_option(0).unwrap();
        // A 被删：题 1 失去答案；B→A, C→B
        assert_eq!(editor.mappings().get(&1), None);
        assert_eq!(editor.mappings().get(&2).map(String::as_str), Some("A"));
        assert_eq!(editor.mappings().get(&3).map(String::as_str), Some("B"));
    }

    #[test]
    fn loading_gapped_numbering_renumbers_before_adding() {
        let commit = EditorCommit {
            type_specific_data: serde_json::json!({
                "items": [
                    {"item_number": 2, "item_text": "first"},
                    {"item_number": 5, "item_text": "second"}
                ],
                "options": [
                    {"option_label": "B", "option_text": "x"},
                    {"option_label": "D", "option_text": "y"}
                ],
                "allow_option_reuse": false
            }),
            answer_data: serde_json::json!({"mappings": {"2": "D", "5": "B", "9": "B"}}),
        };
        let mut editor = MatchingEditor::new();
        editor.load(&commit).unwrap();

        let numbers: Vec<_> = editor.items().iter().map(|i| i.item_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(labels(&editor), vec!["A", "B"]);
        assert_eq!(editor.mappings().get(&1).map(String::as_str), Some("B"));
        assert_eq!(editor.mappings().get(&2).map(String::as_str), Some("A"));
        assert_eq!(editor.mappings().len(), 2);

        editor.add_item();
        assert_eq!(editor.items().last().map(|i| i.item_number), Some(3));
        editor.add_option().unwrap();
        assert_eq!(labels(&editor).last().map(String::as_str), Some("C"));
    }

    #[test]
    fn options_cap_at_z() {
        let mut editor = MatchingEditor::new();
        while editor.options().len() < MAX_OPTIONS {
            editor.add_option().unwrap();
        }
        assert_eq!(labels(&editor).last().map(String::as_str), Some("Z"));
        assert_eq!(editor.add_option(), Err(EditorError::TooManyOptions { max: 26 }));
    }

    #[test]
    fn reuse_constraint_blocks_and_disables_used_options() {
        let mut editor = MatchingEditor::new();
        editor.add_item();
        editor.set_mapping(1, "A").unwrap();
        assert_eq!(
            editor.set_mapping(2, "A"),
            Err(EditorError::OptionAlreadyUsed { label: "A".into(), item: 1 })
        );
        let choices = editor.option_choices(2);
        assert!(choices[0].disabled);
        assert!(!choices[1].disabled);
        assert!(!editor.option_choices(1)[0].disabled);

        editor.set_allow_option_reuse(true);
        editor.set_mapping(2, "A").unwrap();
        assert!(!editor.option_choices(2)[0].disabled);

        // 关闭复用时保留第一题的映射
        editor.set_allow_option_reuse(false);
        assert_eq!(editor.mappings().len(), 1);
        assert!(editor.mappings().contains_key(&1));
    }

    #[test]
    fn warns_when_options_are_fewer_than_items() {
        let mut editor = MatchingEditor::new();
        for _ in 0..3 {
            editor.add_item();
        }
        assert!(editor.needs_more_options());
        editor.set_allow_option_reuse(true);
        assert!(!editor.needs_more_options());
    }

    #[test]
    fn commit_uses_item_numbers_as_answer_keys() {
        let mut editor = MatchingEditor::new();
        editor.set_item_text(0, "Dr Smith").unwrap();
        editor.set_option_text(0, "works in the lab").unwrap();
        editor.set_mapping(1, "A").unwrap();
        let commit = editor.commit().unwrap();
        assert_eq!(commit.answer_data, serde_json::json!({"mappings": {"1": "A"}}));
        assert_eq!(commit.type_specific_data["allow_option_reuse"], false);
        assert_eq!(commit.type_specific_data["items"][0]["item_text"], "Dr Smith");
    }
}
