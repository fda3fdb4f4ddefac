use serde::{Deserialize, Serialize};

/// 写作作答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingAnswer {
    pub task_id: i64,
    pub response_text: String,
}

/// 听力/阅读作答（结构化答案已序列化为字符串）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question_id: i64,
    pub user_answer: String,
}

/// 交卷请求体，一次 PUT 发送
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub writing_answers: Vec<WritingAnswer>,
    pub listening_answers: Vec<QuestionAnswer>,
    pub reading_answers: Vec<QuestionAnswer>,
}

impl SubmissionPayload {
    pub fn total_answers(&self) -> usize {
        self.writing_answers.len() + self.listening_answers.len() + self.reading_answers.len()
    }
}
