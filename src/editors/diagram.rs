use std::collections::BTreeMap;

use crate::editors::{push_answer, remove_answer_at, EditorCommit, QuestionEditor};
use crate::error::EditorError;
use crate::models::schema::{DiagramAnswers, DiagramData, DiagramLabel, WORD_LIMIT_RANGE};

/// 把像素坐标换算成百分比，并限制在 [0, 100]
fn to_percent(px: f64, size: f64) -> f64 {
    (px / size * 100.0).clamp(0.0, 100.0)
}

fn check_size(width: f64, height: f64) -> Result<(), EditorError> {
    if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
        Ok(())
    } else {
        Err(EditorError::InvalidImageSize { width, height })
    }
}

/// 图表/地图标注编辑器
#[derive(Debug, Clone, Default)]
pub struct DiagramEditor {
    data: DiagramData,
    answers: BTreeMap<String, Vec<String>>,
}

impl DiagramEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_url(&self) -> &str {
        &self.data.image_url
    }

    pub fn labels(&self) -> &[DiagramLabel] {
        &self.data.labels
    }

    pub fn max_words_per_label(&self) -> u8 {
        self.data.max_words_per_label
    }

    pub fn answers(&self, label_id: &str) -> &[String] {
        self.answers.get(label_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 设置图片地址（上传完成后调用）
    pub fn set_image_url(&mut self, url: impl Into<String>) {
        self.data.image_url = url.into();
    }

    fn next_label_id(&self) -> String {
        let max = self
            .data
            .labels
            .iter()
            .filter_map(|l| l.label_id.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }

    /// 在图片上点击放置新标签，返回新标签 ID
    ///
    /// `x_px`/`y_px` 是点击位置，`width`/`height` 是图片显示尺寸。
    pub fn place_label(&mut self, x_px: f64, y_px: f64, width: f64, height: f64) -> Result<String, EditorError> {
        if self.data.image_url.is_empty() {
            return Err(EditorError::NoImage);
        }
        check_size(width, height)?;
        let label_id = self.next_label_id();
        self.data.labels.push(DiagramLabel {
            label_id: label_id.clone(),
            x: to_percent(x_px, width),
            y: to_percent(y_px, height),
        });
        self.answers.insert(label_id.clone(), Vec::new());
        Ok(label_id)
    }

    /// 拖动已有标签
    pub fn move_label(&mut self, label_id: &str, x_px: f64, y_px: f64, width: f64, height: f64) -> Result<(), EditorError> {
        check_size(width, height)?;
        let label = self.label_mut(label_id)?;
        label.x = to_percent(x_px, width);
        label.y = to_percent(y_px, height);
        Ok(())
    }

    /// 删除标签及其答案
    pub fn remove_label(&mut self, label_id: &str) -> Result<(), EditorError> {
        let before = self.data.labels.len();
        self.data.labels.retain(|l| l.label_id != label_id);
        if self.data.labels.len() == before {
            return Err(EditorError::UnknownLabel(label_id.to_string()));
        }
        self.answers.remove(label_id);
        Ok(())
    }

    pub fn set_max_words_per_label(&mut self, max_words: u8) -> Result<(), EditorError> {
        if !WORD_LIMIT_RANGE.contains(&max_words) {
            return Err(EditorError::WordLimitOutOfRange(max_words));
        }
        self.data.max_words_per_label = max_words;
        Ok(())
    }

    pub fn add_answer(&mut self, label_id: &str, text: &str) -> Result<(), EditorError> {
        self.label_mut(label_id)?;
        push_answer(self.answers.entry(label_id.to_string()).or_default(), text)
    }

    pub fn remove_answer(&mut self, label_id: &str, index: usize) -> Result<(), EditorError> {
        self.label_mut(label_id)?;
        remove_answer_at(self.answers.entry(label_id.to_string()).or_default(), index)
    }

    fn label_mut(&mut self, label_id: &str) -> Result<&mut DiagramLabel, EditorError> {
        self.data
            .labels
            .iter_mut()
            .find(|l| l.label_id == label_id)
            .ok_or_else(|| EditorError::UnknownLabel(label_id.to_string()))
    }
}

impl QuestionEditor for DiagramEditor {
    fn commit(&self) -> serde_json::Result<EditorCommit> {
        let labels = self
            .data
            .labels
            .iter()
            .map(|l| (l.label_id.clone(), self.answers(&l.label_id).to_vec()))
            .collect();
        EditorCommit::from_parts(&self.data, &DiagramAnswers { labels })
    }

    fn load(&mut self, commit: &EditorCommit) -> serde_json::Result<()> {
        let (data, answers): (DiagramData, DiagramAnswers) = commit.to_parts()?;
        self.data = data;
        self.answers = answers.labels;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with_image() -> DiagramEditor {
        let mut editor = DiagramEditor::new();
        editor.set_image_url("/uploads/images/map.png");
        editor
    }

    #[test]
    fn placing_requires_an_image() {
        let mut editor = DiagramEditor::new();
        assert_eq!(editor.place_label(10.0, 10.0, 100.0, 100.0), Err(EditorError::NoImage));
    }

    #[test]
    fn click_position_is_stored_as_percentages() {
        let mut editor = editor_with_image();
        let id = editor.place_label(200.0, 150.0, 800.0, 600.0).unwrap();
        assert_eq!(id, "1");
        let label = &editor.labels()[0];
        assert!((label.x - 25.0).abs() < 1e-9);
        assert!((label.y - 25.0).abs() < 1e-9);
    }

    #[test]
    fn coordinates_are_clamped_and_not_rounded() {
        let mut editor = editor_with_image();
        editor.place_label(-5.0, 1.0, 300.0, 700.0).unwrap();
        let label = &editor.labels()[0];
        assert_eq!(label.x, 0.0);
        assert!((label.y - 100.0 / 700.0).abs() < 1e-12);

        editor.move_label("1", 900.0, 350.0, 300.0, 700.0).unwrap();
        assert_eq!(editor.labels()[0].x, 100.0);
        assert!((editor.labels()[0].y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let mut editor = editor_with_image();
        assert!(matches!(
            editor.place_label(1.0, 1.0, 0.0, 100.0),
            Err(EditorError::InvalidImageSize { .. })
        ));
    }

    #[test]
    fn new_ids_continue_after_the_largest_one() {
        let mut editor = editor_with_image();
        for _ in 0..3 {
            editor.place_label(1.0, 1.0, 10.0, 10.0).unwrap();
        }
        editor.remove_label("2").unwrap();
        assert_eq!(editor.place_label(1.0, 1.0, 10.0, 10.0).unwrap(), "4");
    }

    #[test]
    fn removing_a_label_removes_its_answers() {
        let mut editor = editor_with_image();
        editor.place_label(1.0, 1.0, 10.0, 10.0).unwrap();
        editor.place_label(2.0, 2.0, 10.0, 10.0).unwrap();
        editor.add_answer("1", "bridge").unwrap();
        editor.add_answer("2", "car park").unwrap();
        editor.remove_label("1").unwrap();

        let commit = editor.commit().unwrap();
        assert_eq!(commit.answer_data, serde_json::json!({"labels": {"2": ["car park"]}}));
        assert_eq!(commit.type_specific_data["max_words_per_label"], 2);
        assert_eq!(editor.remove_label("1"), Err(EditorError::UnknownLabel("1".into())));
    }

    #[test]
    fn word_limit_range_is_enforced() {
        let mut editor = DiagramEditor::new();
        assert_eq!(editor.set_max_words_per_label(0), Err(EditorError::WordLimitOutOfRange(0)));
        editor.set_max_words_per_label(5).unwrap();
        assert_eq!(editor.max_words_per_label(), 5);
    }
}
