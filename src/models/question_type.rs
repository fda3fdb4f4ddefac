//! 题型注册表
//!
//! 把后端的 `question_type` 字符串映射到固定的题型家族。
//! 映射是纯函数：同一字符串永远得到同一家族。

use phf::phf_map;
use serde::Serialize;
use std::fmt;

use crate::models::test::SectionType;

/// 题型家族
///
/// 编辑器、渲染器、判分和校验都对它做穷尽匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFamily {
    /// 句子/笔记/表单/摘要填空
    Completion,
    /// 表格填空
    Table,
    /// 匹配题
    Matching,
    /// 图表/地图/流程图标注
    Diagram,
    /// True/False/Not Given 与 Yes/No/Not Given
    Tfng,
    /// 选择题
    MultipleChoice,
    /// 简答题
    ShortAnswer,
    /// 无法识别的题型，退化为自由文本
    FreeText,
}

impl QuestionFamily {
    /// 按题型字符串确定家族
    ///
    /// 小写后按固定优先级做子串匹配，第一个命中即返回，`FreeText` 永远最后。
    pub fn from_type(question_type: &str) -> Self {
        let t = question_type.to_lowercase();

        if t.contains("completion") || t.contains("fill_in") {
            if t.contains("table") {
                return QuestionFamily::Table;
            }
            return QuestionFamily::Completion;
        }
        if t.contains("table") {
            return QuestionFamily::Table;
        }
        if t.contains("matching") {
            return QuestionFamily::Matching;
        }
        if t.contains("diagram") || t.contains("map") || t.contains("flowchart") {
            return QuestionFamily::Diagram;
        }
        if t.contains("true_false") || t.contains("yes_no") || t.contains("not_given") {
            return QuestionFamily::Tfng;
        }
        if t.contains("multiple_choice") {
            return QuestionFamily::MultipleChoice;
        }
        if t.contains("short_answer") {
            return QuestionFamily::ShortAnswer;
        }
        QuestionFamily::FreeText
    }

    /// 是否有专用的结构化编辑器（选择/简答使用简单表单）
    pub fn has_structured_editor(self) -> bool {
        matches!(
            self,
            QuestionFamily::Completion
                | QuestionFamily::Table
                | QuestionFamily::Matching
                | QuestionFamily::Diagram
                | QuestionFamily::Tfng
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionFamily::Completion => "completion",
            QuestionFamily::Table => "table",
            QuestionFamily::Matching => "matching",
            QuestionFamily::Diagram => "diagram",
            QuestionFamily::Tfng => "tfng",
            QuestionFamily::MultipleChoice => "multiple_choice",
            QuestionFamily::ShortAnswer => "short_answer",
            QuestionFamily::FreeText => "free_text",
        }
    }
}

impl fmt::Display for QuestionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 题型目录中的一项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTypeOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// 题型目录中的一个分类
#[derive(Debug, Clone, Copy)]
pub struct QuestionTypeCategory {
    pub section: SectionType,
    pub category: &'static str,
    pub types: &'static [QuestionTypeOption],
}

macro_rules! opts {
    ($($value:literal => $label:literal),* $(,)?) => {
        &[$(QuestionTypeOption { value: $value, label: $label }),*]
    };
}

/// 作者端可选的题型目录（按部分 → 分类）
pub static QUESTION_TYPE_CATEGORIES: &[QuestionTypeCategory] = &[
    QuestionTypeCategory {
        section: SectionType::Listening,
        category: "completion",
        types: opts![
            "listening_form_completion" => "Form Completion",
            "listening_note_completion" => "Note Completion",
            "listening_table_completion" => "Table Completion",
            "listening_summary_completion" => "Summary Completion",
            "listening_sentence_completion" => "Sentence Completion",
        ],
    },
    QuestionTypeCategory {
        section: SectionType::Listening,
        category: "matching",
        types: opts![
            "listening_matching_headings" => "Matching Headings",
            "listening_matching_sentence_endings" => "Matching Sentence Endings",
            "listening_matching_paragraphs" => "Matching Paragraphs",
            "listening_name_matching" => "Name Matching",
        ],
    },
    QuestionTypeCategory {
        section: SectionType::Listening,
        category: "choice",
        types: opts![
            "listening_multiple_choice" => "Multiple Choice",
            "listening_short_answer" => "Short Answer",
        ],
    },
    QuestionTypeCategory {
        section: SectionType::Listening,
        category: "diagram",
        types: opts![
            "listening_diagram_labeling" => "Diagram Labeling",
            "listening_map_labeling" => "Map Labeling",
        ],
    },
    QuestionTypeCategory {
        section: SectionType::Reading,
        category: "completion",
        types: opts![
            "reading_form_completion" => "Form Completion",
            "reading_table_completion" => "Table Completion",
            "reading_note_completion" => "Note Completion",
            "reading_sentence_completion" => "Sentence Completion",
            "reading_summary_completion" => "Summary Completion",
        ],
    },
    QuestionTypeCategory {
        section: SectionType::Reading,
        category: "matching",
        types: opts![
            "reading_matching_headings" => "Matching Headings",
            "reading_matching_information" => "Matching Information",
            "reading_matching_features" => "Matching Features",
            "reading_matching_sentence_endings" => "Matching Sentence Endings",
        ],
    },
    QuestionTypeCategory {
        section: SectionType::Reading,
        category: "choice",
        types: opts![
            "reading_multiple_choice" => "Multiple Choice",
            "reading_short_answer" => "Short Answer",
        ],
    },
    QuestionTypeCategory {
        section: SectionType::Reading,
        category: "diagram",
        types: opts![
            "reading_diagram_labeling" => "Diagram Labeling",
            "reading_flowchart" => "Flowchart",
        ],
    },
    QuestionTypeCategory {
        section: SectionType::Reading,
        category: "tfng",
        types: opts![
            "reading_true_false_not_given" => "True/False/Not Given",
            "reading_yes_no_not_given" => "Yes/No/Not Given",
        ],
    },
];

/// 题型值 → 显示名称
static QUESTION_TYPE_LABELS: phf::Map<&'static str, &'static str> = phf_map! {
    "listening_form_completion" => "Form Completion",
    "listening_note_completion" => "Note Completion",
    "listening_table_completion" => "Table Completion",
    "listening_summary_completion" => "Summary Completion",
    "listening_sentence_completion" => "Sentence Completion",
    "listening_matching_headings" => "Matching Headings",
    "listening_matching_sentence_endings" => "Matching Sentence Endings",
    "listening_matching_paragraphs" => "Matching Paragraphs",
    "listening_name_matching" => "Name Matching",
    "listening_multiple_choice" => "Multiple Choice",
    "listening_short_answer" => "Short Answer",
    "listening_diagram_labeling" => "Diagram Labeling",
    "listening_map_labeling" => "Map Labeling",
    "reading_form_completion" => "Form Completion",
    "reading_table_completion" => "Table Completion",
    "reading_note_completion" => "Note Completion",
    "reading_sentence_completion" => "Sentence Completion",
    "reading_summary_completion" => "Summary Completion",
    "reading_matching_headings" => "Matching Headings",
    "reading_matching_information" => "Matching Information",
    "reading_matching_features" => "Matching Features",
    "reading_matching_sentence_endings" => "Matching Sentence Endings",
    "reading_multiple_choice" => "Multiple Choice",
    "reading_short_answer" => "Short Answer",
    "reading_diagram_labeling" => "Diagram Labeling",
    "reading_flowchart" => "Flowchart",
    "reading_true_false_not_given" => "True/False/Not Given",
    "reading_yes_no_not_given" => "Yes/No/Not Given",
};

/// 查询题型的显示名称
pub fn type_label(value: &str) -> Option<&'static str> {
    QUESTION_TYPE_LABELS.get(value).copied()
}

/// 某个部分（听力/阅读）可选的全部题型
pub fn types_for_section(section: SectionType) -> impl Iterator<Item = &'static QuestionTypeOption> {
    QUESTION_TYPE_CATEGORIES
        .iter()
        .filter(move |c| c.section == section)
        .flat_map(|c| c.types.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_family_wins_over_table_check() {
        assert_eq!(QuestionFamily::from_type("listening_form_completion"), QuestionFamily::Completion);
        assert_eq!(QuestionFamily::from_type("listening_fill_in_blank"), QuestionFamily::Completion);
        assert_eq!(QuestionFamily::from_type("reading_table_completion"), QuestionFamily::Table);
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        assert_eq!(QuestionFamily::from_type("READING_Matching_Headings"), QuestionFamily::Matching);
        assert_eq!(QuestionFamily::from_type("Listening_Map_Labeling"), QuestionFamily::Diagram);
    }

    #[test]
    fn recognises_every_family() {
        assert_eq!(QuestionFamily::from_type("listening_name_matching"), QuestionFamily::Matching);
        assert_eq!(QuestionFamily::from_type("listening_map_diagram"), QuestionFamily::Diagram);
        assert_eq!(QuestionFamily::from_type("reading_flowchart"), QuestionFamily::Diagram);
        assert_eq!(QuestionFamily::from_type("reading_yes_no_not_given"), QuestionFamily::Tfng);
        assert_eq!(QuestionFamily::from_type("listening_true_false_not_given"), QuestionFamily::Tfng);
        assert_eq!(QuestionFamily::from_type("reading_multiple_choice"), QuestionFamily::MultipleChoice);
        assert_eq!(QuestionFamily::from_type("listening_short_answer"), QuestionFamily::ShortAnswer);
    }

    #[test]
    fn unknown_types_fall_back_to_free_text() {
        assert_eq!(QuestionFamily::from_type("essay"), QuestionFamily::FreeText);
        assert_eq!(QuestionFamily::from_type(""), QuestionFamily::FreeText);
    }

    #[test]
    fn every_catalog_entry_has_label_and_structured_family() {
        for category in QUESTION_TYPE_CATEGORIES {
            for option in category.types {
                assert_eq!(type_label(option.value), Some(option.label));
                assert_ne!(QuestionFamily::from_type(option.value), QuestionFamily::FreeText);
            }
        }
    }

    #[test]
    fn only_reading_has_tfng_category() {
        assert!(types_for_section(SectionType::Reading).any(|o| o.value.contains("not_given")));
        assert!(!types_for_section(SectionType::Listening).any(|o| o.value.contains("not_given")));
    }
}
