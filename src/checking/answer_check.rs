//! 本地判分
//!
//! 与平台后端的判分规则一致，用于作答结束后的自查与回归测试。

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::models::grade::correct_answers_to_band;
use crate::models::schema::{BlankConfig, DEFAULT_BLANK_MAX_WORDS};
use crate::models::{AnswerValue, Question, TypedQuestion};
use crate::utils::text::within_word_limit;

static OPTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((.*?)\)").unwrap());

/// 可省略词组数上限，超过时不再展开组合
const MAX_OPTIONAL_GROUPS: usize = 10;

/// 单个空位/标签/题目的判分结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotResult {
    pub key: String,
    pub correct: bool,
    pub user_answer: String,
    /// 超出字数限制时给出上限
    pub word_limit_exceeded: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub is_correct: bool,
    /// 0.0 - 1.0
    pub score: f64,
    pub details: Vec<SlotResult>,
}

impl CheckOutcome {
    fn from_slots(details: Vec<SlotResult>) -> Self {
        let total = details.len();
        let correct = details.iter().filter(|r| r.correct).count();
        Self {
            is_correct: correct == total,
            score: correct as f64 / total.max(1) as f64,
            details,
        }
    }

    fn single(is_correct: bool) -> Self {
        Self {
            is_correct,
            score: if is_correct { 1.0 } else { 0.0 },
            details: Vec::new(),
        }
    }
}

/// 按一个部分的判分结果估算分数：完全答对的题目计数后换算
pub fn estimated_band(outcomes: &[CheckOutcome]) -> f64 {
    let correct = outcomes.iter().filter(|o| o.is_correct).count();
    correct_answers_to_band(correct, outcomes.len())
}

/// 去首尾空白，不区分大小写时转小写
pub fn normalize(text: &str, case_sensitive: bool) -> String {
    let trimmed = text.trim();
    if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// 展开括号中的可省略词：`(fast) food` → `fast food`, `food`
pub fn expand_optional_answers(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let groups: Vec<_> = OPTIONAL_RE.captures_iter(text).collect();
    if groups.is_empty() {
        return vec![text.to_string()];
    }
    if groups.len() > MAX_OPTIONAL_GROUPS {
        return vec![text.split_whitespace().collect::<Vec<_>>().join(" ")];
    }

    let mut variations: Vec<String> = Vec::new();
    for mask in 0..(1u32 << groups.len()) {
        let mut out = String::new();
        let mut last = 0;
        for (bit, caps) in groups.iter().enumerate() {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&text[last..whole.start()]);
            if mask >> bit & 1 == 1 {
                out.push_str(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
            }
            last = whole.end();
        }
        out.push_str(&text[last..]);
        let cleaned = out.split_whitespace().collect::<Vec<_>>().join(" ");
        if !variations.contains(&cleaned) {
            variations.push(cleaned);
        }
    }
    variations
}

fn matches_any(user: &str, accepted: &[String], case_sensitive: bool) -> bool {
    let user = normalize(user, case_sensitive);
    accepted
        .iter()
        .flat_map(|a| expand_optional_answers(a))
        .any(|v| normalize(&v, case_sensitive) == user)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn object_to_slots(map: &Map<String, Value>) -> BTreeMap<String, String> {
    map.iter().map(|(k, v)| (k.clone(), value_to_string(v))).collect()
}

/// 取映射型作答，兼容 `{"blanks": {...}}` 这类包装形式与扁平映射
fn slot_map(answer: &Value, wrapper: &str) -> BTreeMap<String, String> {
    match answer {
        Value::Object(map) => match map.get(wrapper) {
            Some(Value::Object(inner)) => object_to_slots(inner),
            _ => object_to_slots(map),
        },
        _ => BTreeMap::new(),
    }
}

fn selected_labels(answer: &Value) -> Vec<String> {
    let list: &[Value] = match answer {
        Value::String(s) => return vec![s.to_uppercase()],
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("selected") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    list.iter()
        .map(value_to_string)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_uppercase())
        .collect()
}

fn answer_text(answer: &Value) -> String {
    match answer {
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("answer"))
            .map(value_to_string)
            .unwrap_or_default(),
        other => value_to_string(other),
    }
}

fn check_blanks(
    configs: &[BlankConfig],
    correct: &BTreeMap<String, Vec<String>>,
    answer: &Value,
) -> CheckOutcome {
    let user = match answer {
        // 旧数据：整题只有一个字符串
        Value::String(s) => BTreeMap::from([("BLANK_1".to_string(), s.clone())]),
        other => slot_map(other, "blanks"),
    };
    let details = correct
        .iter()
        .map(|(blank_id, accepted)| {
            let config = configs.iter().find(|b| &b.blank_id == blank_id);
            let max_words = config.map(|b| b.max_words).unwrap_or(DEFAULT_BLANK_MAX_WORDS);
            let case_sensitive = config.map(|b| b.case_sensitive).unwrap_or(false);
            let user_answer = user.get(blank_id).cloned().unwrap_or_default();
            let over = !within_word_limit(&user_answer, max_words as usize);
            SlotResult {
                key: blank_id.clone(),
                correct: !over && matches_any(&user_answer, accepted, case_sensitive),
                word_limit_exceeded: over.then_some(max_words),
                user_answer,
            }
        })
        .collect();
    CheckOutcome::from_slots(details)
}

fn normalize_verdict(text: &str) -> String {
    text.to_uppercase().replace('_', " ").trim().to_string()
}

/// 对一道题判分，`answer` 为学生作答的 JSON
pub fn check_answer(question: &Question, answer: &Value) -> CheckOutcome {
    match question.typed() {
        TypedQuestion::Completion(data, correct) => check_blanks(&data.blanks, &correct.blanks, answer),
        TypedQuestion::Table(data, correct) => check_blanks(&data.blanks, &correct.blanks, answer),
        TypedQuestion::Matching(_, correct) => {
            let user = slot_map(answer, "mappings");
            let details = correct
                .mappings
                .iter()
                .map(|(item, label)| {
                    let key = item.to_string();
                    let user_answer = user.get(&key).cloned().unwrap_or_default();
                    SlotResult {
                        correct: user_answer.to_uppercase() == label.to_uppercase(),
                        key,
                        user_answer,
                        word_limit_exceeded: None,
                    }
                })
                .collect();
            CheckOutcome::from_slots(details)
        }
        TypedQuestion::Diagram(data, correct) => {
            let user = slot_map(answer, "labels");
            let max_words = data.max_words_per_label;
            let details = correct
                .labels
                .iter()
                .map(|(label_id, accepted)| {
                    let user_answer = user.get(label_id).cloned().unwrap_or_default();
                    let over = !within_word_limit(&user_answer, max_words as usize);
                    let user_norm = normalize(&user_answer, false);
                    SlotResult {
                        key: label_id.clone(),
                        correct: !over && accepted.iter().any(|a| normalize(a, false) == user_norm),
                        word_limit_exceeded: over.then_some(max_words),
                        user_answer,
                    }
                })
                .collect();
            CheckOutcome::from_slots(details)
        }
        TypedQuestion::Tfng(_, correct) => {
            let user = slot_map(answer, "answers");
            let details = correct
                .answers
                .iter()
                .map(|(number, verdict)| {
                    let key = number.to_string();
                    let user_answer = user.get(&key).cloned().unwrap_or_default();
                    SlotResult {
                        correct: normalize_verdict(&user_answer) == normalize_verdict(verdict),
                        key,
                        user_answer,
                        word_limit_exceeded: None,
                    }
                })
                .collect();
            CheckOutcome::from_slots(details)
        }
        TypedQuestion::MultipleChoice(data, correct) => {
            let mut expected: Vec<String> = correct.correct_options.iter().map(|c| c.to_uppercase()).collect();
            expected.sort();
            expected.dedup();
            let mut chosen = selected_labels(answer);
            chosen.sort();
            chosen.dedup();

            let is_correct = chosen == expected;
            let score = if data.allow_multiple && !expected.is_empty() {
                let hits = chosen.iter().filter(|c| expected.contains(c)).count() as f64;
                let misses = chosen.iter().filter(|c| !expected.contains(c)).count() as f64;
                ((hits - misses) / expected.len() as f64).max(0.0)
            } else if is_correct {
                1.0
            } else {
                0.0
            };
            CheckOutcome {
                is_correct,
                score,
                details: Vec::new(),
            }
        }
        TypedQuestion::ShortAnswer(data, correct) => {
            let text = answer_text(answer);
            if !within_word_limit(&text, data.max_words as usize) {
                return CheckOutcome::single(false);
            }
            CheckOutcome::single(matches_any(&text, &correct.correct_answers, data.case_sensitive))
        }
        TypedQuestion::FreeText(correct) => {
            let accepted: Vec<String> = correct.all().cloned().collect();
            CheckOutcome::single(matches_any(&answer_text(answer), &accepted, correct.case_sensitive))
        }
    }
}

/// 对渲染器产生的作答值判分
pub fn check_value(question: &Question, answer: &AnswerValue) -> CheckOutcome {
    let value = serde_json::to_value(answer).unwrap_or(Value::Null);
    check_answer(question, &value)
}
