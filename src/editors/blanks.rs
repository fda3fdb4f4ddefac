//! `[BLANK_N]` 空位的识别与配置
//!
//! 填空题和表格题共用这一套逻辑。

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::editors::{push_answer, remove_answer_at};
use crate::error::EditorError;
use crate::models::schema::{BlankAnswers, BlankConfig, WORD_LIMIT_RANGE};

static BLANK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[BLANK_(\d+)\]").unwrap());

/// 文本片段：普通文字或空位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Blank(String),
}

/// 按出现顺序列出文本中的空位 ID，重复的只保留第一次
pub fn detect_blank_ids(text: &str) -> Vec<String> {
    let mut ids = Vec::new();
    collect_blank_ids(text, &mut ids);
    ids
}

/// 把文本中的空位 ID 追加到 `ids`（已存在的跳过）
pub fn collect_blank_ids(text: &str, ids: &mut Vec<String>) {
    for caps in BLANK_RE.captures_iter(text) {
        let id = format!("BLANK_{}", &caps[1]);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
}

/// 把文本切成文字与空位交替的片段
pub fn split_segments(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in BLANK_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Text(text[last..whole.start()].to_string()));
        }
        segments.push(Segment::Blank(format!("BLANK_{}", &caps[1])));
        last = whole.end();
    }
    if last < text.len() {
        segments.push(Segment::Text(text[last..].to_string()));
    }
    segments
}

/// 用最新识别到的空位重建配置列表
///
/// 已配置过的保留原配置，新出现的用默认值，不再出现的丢弃。
pub fn reconcile_blanks(ids: &[String], previous: &[BlankConfig]) -> Vec<BlankConfig> {
    ids.iter()
        .map(|id| {
            previous
                .iter()
                .find(|b| &b.blank_id == id)
                .cloned()
                .unwrap_or_else(|| BlankConfig::with_defaults(id.clone()))
        })
        .collect()
}

/// 空位配置与答案（填空、表格共用的草稿部分）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlankSet {
    blanks: Vec<BlankConfig>,
    /// 删掉的空位答案仍留在草稿里，重新出现时恢复
    answers: BTreeMap<String, Vec<String>>,
}

impl BlankSet {
    pub fn from_parts(blanks: Vec<BlankConfig>, answers: BlankAnswers) -> Self {
        Self {
            blanks,
            answers: answers.blanks,
        }
    }

    pub fn blanks(&self) -> &[BlankConfig] {
        &self.blanks
    }

    /// 按新识别的 ID 同步，返回是否有变化
    pub fn sync(&mut self, ids: &[String]) -> bool {
        let unchanged = self.blanks.len() == ids.len()
            && self.blanks.iter().zip(ids).all(|(b, id)| &b.blank_id == id);
        if unchanged {
            return false;
        }
        self.blanks = reconcile_blanks(ids, &self.blanks);
        true
    }

    fn config_mut(&mut self, blank_id: &str) -> Result<&mut BlankConfig, EditorError> {
        self.blanks
            .iter_mut()
            .find(|b| b.blank_id == blank_id)
            .ok_or_else(|| EditorError::UnknownBlank(blank_id.to_string()))
    }

    pub fn set_max_words(&mut self, blank_id: &str, max_words: u8) -> Result<(), EditorError> {
        if !WORD_LIMIT_RANGE.contains(&max_words) {
            return Err(EditorError::WordLimitOutOfRange(max_words));
        }
        self.config_mut(blank_id)?.max_words = max_words;
        Ok(())
    }

    pub fn set_case_sensitive(&mut self, blank_id: &str, case_sensitive: bool) -> Result<(), EditorError> {
        self.config_mut(blank_id)?.case_sensitive = case_sensitive;
        Ok(())
    }

    pub fn answers(&self, blank_id: &str) -> &[String] {
        self.answers.get(blank_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_answer(&mut self, blank_id: &str, text: &str) -> Result<(), EditorError> {
        self.config_mut(blank_id)?;
        push_answer(self.answers.entry(blank_id.to_string()).or_default(), text)
    }

    pub fn remove_answer(&mut self, blank_id: &str, index: usize) -> Result<(), EditorError> {
        self.config_mut(blank_id)?;
        remove_answer_at(self.answers.entry(blank_id.to_string()).or_default(), index)
    }

    /// 提交用的答案：恰好覆盖当前所有空位
    pub fn committed_answers(&self) -> BlankAnswers {
        BlankAnswers {
            blanks: self
                .blanks
                .iter()
                .map(|b| (b.blank_id.clone(), self.answers(&b.blank_id).to_vec()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn detects_distinct_blanks_in_first_appearance_order() {
        let text = "[BLANK_2] then [BLANK_1] and [BLANK_2] again, [BLANK] is not a blank";
        assert_eq!(detect_blank_ids(text), ids(&["BLANK_2", "BLANK_1"]));
    }

    #[test]
    fn splits_text_and_blanks_alternately() {
        let segments = split_segments("Name: [BLANK_1] Age:[BLANK_2]");
        assert_eq!(
            segments,
            vec![
                Segment::Text("Name: ".into()),
                Segment::Blank("BLANK_1".into()),
                Segment::Text(" Age:".into()),
                Segment::Blank("BLANK_2".into()),
            ]
        );
        assert_eq!(split_segments("plain"), vec![Segment::Text("plain".into())]);
    }

    #[test]
    fn malformed_markers_are_plain_text() {
        assert_eq!(detect_blank_ids("[BLANK_] [blank_1] [BLANK_12]"), ids(&["BLANK_12"]));
        assert_eq!(split_segments("[BLANK_x]"), vec![Segment::Text("[BLANK_x]".into())]);
    }

    #[test]
    fn reconcile_keeps_existing_config_and_defaults_new() {
        let mut custom = BlankConfig::with_defaults("BLANK_1");
        custom.max_words = 1;
        custom.case_sensitive = true;
        let stale = BlankConfig::with_defaults("BLANK_9");
        let out = reconcile_blanks(&ids(&["BLANK_1", "BLANK_2"]), &[custom.clone(), stale]);
        assert_eq!(out, vec![custom, BlankConfig::with_defaults("BLANK_2")]);
    }

    #[test]
    fn sync_reports_changes_only_once() {
        let mut set = BlankSet::default();
        assert!(set.sync(&ids(&["BLANK_1"])));
        assert!(!set.sync(&ids(&["BLANK_1"])));
        assert!(set.sync(&ids(&["BLANK_1", "BLANK_2"])));
    }

    #[test]
    fn committed_answers_cover_exactly_the_present_blanks() {
        let mut set = BlankSet::default();
        set.sync(&ids(&["BLANK_1", "BLANK_2"]));
        set.add_answer("BLANK_1", " river ").unwrap();
        set.sync(&ids(&["BLANK_2", "BLANK_3"]));
        let committed = set.committed_answers();
        assert_eq!(committed.blanks.keys().cloned().collect::<Vec<_>>(), ids(&["BLANK_2", "BLANK_3"]));
        assert!(committed.blanks["BLANK_2"].is_empty());

        // 空位重新出现时答案恢复
        set.sync(&ids(&["BLANK_1"]));
        assert_eq!(set.committed_answers().blanks["BLANK_1"], vec!["river"]);
    }

    #[test]
    fn word_limit_must_stay_within_one_to_five() {
        let mut set = BlankSet::default();
        set.sync(&ids(&["BLANK_1"]));
        assert_eq!(set.set_max_words("BLANK_1", 6), Err(EditorError::WordLimitOutOfRange(6)));
        assert_eq!(set.set_max_words("BLANK_1", 0), Err(EditorError::WordLimitOutOfRange(0)));
        assert!(set.set_max_words("BLANK_1", 5).is_ok());
        assert_eq!(
            set.set_max_words("BLANK_7", 2),
            Err(EditorError::UnknownBlank("BLANK_7".into()))
        );
    }
}
