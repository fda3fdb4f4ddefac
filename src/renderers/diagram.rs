use crate::models::answer::with_slot;
use crate::models::schema::DiagramData;
use crate::models::AnswerValue;

/// 图片上的一个标注点，坐标为百分比
#[derive(Debug, Clone, PartialEq)]
pub struct PinView {
    pub label_id: String,
    pub x: f64,
    pub y: f64,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramView {
    pub image_url: String,
    pub pins: Vec<PinView>,
    pub max_words: u8,
}

pub fn render(data: &DiagramData, answer: Option<&AnswerValue>) -> DiagramView {
    DiagramView {
        image_url: data.image_url.clone(),
        pins: data
            .labels
            .iter()
            .map(|l| PinView {
                label_id: l.label_id.clone(),
                x: l.x,
                y: l.y,
                value: answer.map(|a| a.slot(&l.label_id)).unwrap_or("").to_string(),
            })
            .collect(),
        max_words: data.max_words_per_label,
    }
}

pub fn fill(data: &DiagramData, current: Option<&AnswerValue>, key: String, value: String) -> Result<AnswerValue, String> {
    if !data.labels.iter().any(|l| l.label_id == key) {
        return Err(format!("标签 {} 不存在", key));
    }
    Ok(with_slot(current, key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::DiagramLabel;

    #[test]
    fn pins_keep_their_percent_positions() {
        let data = DiagramData {
            image_url: "/uploads/images/plan.png".into(),
            labels: vec![DiagramLabel { label_id: "1".into(), x: 25.5, y: 30.0 }],
            max_words_per_label: 2,
        };
        let answer = fill(&data, None, "1".into(), "reception".into()).unwrap();
        let view = render(&data, Some(&answer));
        assert_eq!(view.pins[0].x, 25.5);
        assert_eq!(view.pins[0].value, "reception");
        assert_eq!(view.max_words, 2);
        assert!(fill(&data, None, "2".into(), "x".into()).is_err());
    }
}
