use crate::editors::blanks::{split_segments, Segment};
use crate::models::answer::with_slot;
use crate::models::schema::{BlankConfig, CompletionData, TableData, DEFAULT_BLANK_MAX_WORDS};
use crate::models::AnswerValue;

/// 文本片段或输入框
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentView {
    Text(String),
    Input {
        blank_id: String,
        value: String,
        max_words: u8,
    },
}

impl SegmentView {
    /// 输入框的占位提示，如 `(3 words)`
    pub fn placeholder(&self) -> Option<String> {
        match self {
            SegmentView::Input { max_words, .. } => Some(format!("({} words)", max_words)),
            SegmentView::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionView {
    pub segments: Vec<SegmentView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<String>,
    /// 行 → 单元格 → 片段
    pub rows: Vec<Vec<Vec<SegmentView>>>,
}

fn segment_views(text: &str, blanks: &[BlankConfig], answer: Option<&AnswerValue>) -> Vec<SegmentView> {
    split_segments(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => SegmentView::Text(text),
            Segment::Blank(blank_id) => {
                let max_words = blanks
                    .iter()
                    .find(|b| b.blank_id == blank_id)
                    .map(|b| b.max_words)
                    .unwrap_or(DEFAULT_BLANK_MAX_WORDS);
                let value = answer.map(|a| a.slot(&blank_id)).unwrap_or("").to_string();
                SegmentView::Input {
                    blank_id,
                    value,
                    max_words,
                }
            }
        })
        .collect()
}

pub fn render_completion(data: &CompletionData, answer: Option<&AnswerValue>) -> CompletionView {
    CompletionView {
        segments: segment_views(&data.template_text, &data.blanks, answer),
    }
}

pub fn render_table(data: &TableData, answer: Option<&AnswerValue>) -> TableView {
    TableView {
        headers: data.table_structure.headers.clone(),
        rows: data
            .table_structure
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| segment_views(cell, &data.blanks, answer)).collect())
            .collect(),
    }
}

fn fill_blank(blanks: &[BlankConfig], current: Option<&AnswerValue>, key: String, value: String) -> Result<AnswerValue, String> {
    if !blanks.iter().any(|b| b.blank_id == key) {
        return Err(format!("空位 {} 不存在", key));
    }
    Ok(with_slot(current, key, value))
}

pub fn fill_completion(
    data: &CompletionData,
    current: Option<&AnswerValue>,
    key: String,
    value: String,
) -> Result<AnswerValue, String> {
    fill_blank(&data.blanks, current, key, value)
}

pub fn fill_table(data: &TableData, current: Option<&AnswerValue>, key: String, value: String) -> Result<AnswerValue, String> {
    fill_blank(&data.blanks, current, key, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::TableStructure;

    fn completion() -> CompletionData {
        CompletionData {
            template_text: "Name: [BLANK_1] Street: [BLANK_2]".into(),
            blanks: vec![BlankConfig::with_defaults("BLANK_1"), {
                let mut b = BlankConfig::with_defaults("BLANK_2");
                b.max_words = 2;
                b
            }],
        }
    }

    #[test]
    fn inputs_show_current_values_and_limits() {
        let answer = with_slot(None, "BLANK_2", "Hill Road");
        let view = render_completion(&completion(), Some(&answer));
        assert_eq!(
            view.segments,
            vec![
                SegmentView::Text("Name: ".into()),
                SegmentView::Input { blank_id: "BLANK_1".into(), value: String::new(), max_words: 3 },
                SegmentView::Text(" Street: ".into()),
                SegmentView::Input { blank_id: "BLANK_2".into(), value: "Hill Road".into(), max_words: 2 },
            ]
        );
    }

    #[test]
    fn typing_updates_one_blank_and_keeps_the_rest() {
        let data = completion();
        let first = fill_completion(&data, None, "BLANK_1".into(), "Anna".into()).unwrap();
        let second = fill_completion(&data, Some(&first), "BLANK_2".into(), "Hill Road".into()).unwrap();
        assert_eq!(second.slot("BLANK_1"), "Anna");
        assert_eq!(second.slot("BLANK_2"), "Hill Road");
        assert!(fill_completion(&data, None, "BLANK_9".into(), "x".into()).is_err());
    }

    #[test]
    fn table_cells_are_split_like_templates() {
        let data = TableData {
            table_structure: TableStructure {
                headers: vec!["Room".into(), "Price".into()],
                rows: vec![vec!["Single".into(), "£[BLANK_1]".into()]],
            },
            blanks: vec![BlankConfig::with_defaults("BLANK_1")],
        };
        let view = render_table(&data, None);
        assert_eq!(view.headers, vec!["Room", "Price"]);
        assert_eq!(view.rows[0][0], vec![SegmentView::Text("Single".into())]);
        assert_eq!(view.rows[0][1].len(), 2);
    }
}
