use crate::editors::matching::OptionChoice;
use crate::models::answer::with_slot;
use crate::models::schema::MatchingData;
use crate::models::AnswerValue;

/// 匹配题的一行：题目文本加下拉框
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingRow {
    pub item_number: u32,
    pub item_text: String,
    pub selected: String,
    pub choices: Vec<OptionChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingView {
    pub rows: Vec<MatchingRow>,
}

/// 某个选项是否已被其它题目选中
fn used_elsewhere(answer: Option<&AnswerValue>, item_key: &str, label: &str) -> bool {
    match answer {
        Some(AnswerValue::Slots(map)) => map.iter().any(|(k, v)| k != item_key && v == label),
        _ => false,
    }
}

pub fn render(data: &MatchingData, answer: Option<&AnswerValue>) -> MatchingView {
    let rows = data
        .items
        .iter()
        .map(|item| {
            let key = item.item_number.to_string();
            let choices = data
                .options
                .iter()
                .map(|o| OptionChoice {
                    label: o.option_label.clone(),
                    text: o.option_text.clone(),
                    disabled: !data.allow_option_reuse && used_elsewhere(answer, &key, &o.option_label),
                })
                .collect();
            MatchingRow {
                item_number: item.item_number,
                item_text: item.item_text.clone(),
                selected: answer.map(|a| a.slot(&key)).unwrap_or("").to_string(),
                choices,
            }
        })
        .collect();
    MatchingView { rows }
}

/// 为题目选择选项；空字符串表示清空
pub fn choose(data: &MatchingData, current: Option<&AnswerValue>, key: String, label: String) -> Result<AnswerValue, String> {
    if !data.items.iter().any(|i| i.item_number.to_string() == key) {
        return Err(format!("题目 {} 不存在", key));
    }
    if !label.is_empty() {
        if !data.options.iter().any(|o| o.option_label == label) {
            return Err(format!("选项 {} 不存在", label));
        }
        if !data.allow_option_reuse && used_elsewhere(current, &key, &label) {
            return Err(format!("选项 {} 已被其它题目选用", label));
        }
    }
    Ok(with_slot(current, key, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::{ChoiceOption, MatchingItem};

    fn data(allow_option_reuse: bool) -> MatchingData {
        MatchingData {
            items: (1..=2)
                .map(|n| MatchingItem { item_number: n, item_text: format!("person {}", n) })
                .collect(),
            options: vec![ChoiceOption::new("A", "x"), ChoiceOption::new("B", "y"), ChoiceOption::new("C", "z")],
            allow_option_reuse,
        }
    }

    #[test]
    fn used_options_are_disabled_for_other_items() {
        let d = data(false);
        let answer = choose(&d, None, "1".into(), "A".into()).unwrap();
        let view = render(&d, Some(&answer));
        assert_eq!(view.rows[0].selected, "A");
        assert!(!view.rows[0].choices[0].disabled);
        assert!(view.rows[1].choices[0].disabled);
        assert!(choose(&d, Some(&answer), "2".into(), "A".into()).is_err());
    }

    #[test]
    fn reuse_allows_the_same_option_twice() {
        let d = data(true);
        let answer = choose(&d, None, "1".into(), "A".into()).unwrap();
        let answer = choose(&d, Some(&answer), "2".into(), "A".into()).unwrap();
        assert_eq!(answer.slot("2"), "A");
        assert!(render(&d, Some(&answer)).rows.iter().all(|r| r.choices.iter().all(|c| !c.disabled)));
    }

    #[test]
    fn clearing_frees_the_option() {
        let d = data(false);
        let answer = choose(&d, None, "1".into(), "B".into()).unwrap();
        let answer = choose(&d, Some(&answer), "1".into(), String::new()).unwrap();
        assert!(choose(&d, Some(&answer), "2".into(), "B".into()).is_ok());
    }
}
