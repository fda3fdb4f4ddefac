//! 考试作答导航
//!
//! 状态为（部分序号, 项目序号）。项目随部分类型不同：听力 Part、阅读文章、
//! 写作任务或口语任务。作答只保存在内存中，交卷时一次性序列化。

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::AttemptError;
use crate::models::submission::{QuestionAnswer, WritingAnswer};
use crate::models::test::{ListeningPart, ReadingPassage, SpeakingTask, TestSection, WritingTask};
use crate::models::{AnswerValue, Question, SectionType, SubmissionPayload, TestAttemptWithDetails, TestStructure};
use crate::renderers::{self, Response};
use crate::utils::word_count;

/// 作答映射的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnswerKey {
    /// 听力/阅读题目 ID
    Question(i64),
    /// 写作任务 ID
    Writing(i64),
}

/// 当前部分中的一个导航项
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SectionItem<'a> {
    Part(&'a ListeningPart),
    Passage(&'a ReadingPassage),
    Writing(&'a WritingTask),
    Speaking(&'a SpeakingTask),
}

impl SectionItem<'_> {
    pub fn id(&self) -> i64 {
        match self {
            SectionItem::Part(p) => p.id,
            SectionItem::Passage(p) => p.id,
            SectionItem::Writing(t) => t.id,
            SectionItem::Speaking(t) => t.id,
        }
    }
}

/// 结束一个部分后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// 进入下一个部分（新的部分序号）
    Advanced(usize),
    /// 最后一个部分已结束，需要交卷
    Submit,
}

#[derive(Debug, Clone)]
pub struct AttemptSession {
    attempt_id: i64,
    title: String,
    sections: Vec<TestSection>,
    structure: TestStructure,
    section_index: usize,
    item_index: usize,
    answers: BTreeMap<AnswerKey, AnswerValue>,
    submitted: bool,
}

impl AttemptSession {
    pub fn new(details: TestAttemptWithDetails) -> Result<Self, AttemptError> {
        let mut sections = details.test_template.sections;
        if sections.is_empty() {
            return Err(AttemptError::NoSections);
        }
        sections.sort_by_key(|s| s.order);

        let mut structure = details.test_structure;
        structure.listening_parts.sort_by_key(|p| p.part_number);
        structure.reading_passages.sort_by_key(|p| p.order);
        structure.writing_tasks.sort_by_key(|t| t.task_number);
        structure.speaking_tasks.sort_by_key(|t| t.order);

        Ok(Self {
            attempt_id: details.attempt.id,
            title: details.test_template.title,
            sections,
            structure,
            section_index: 0,
            item_index: 0,
            answers: BTreeMap::new(),
            submitted: false,
        })
    }

    pub fn attempt_id(&self) -> i64 {
        self.attempt_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sections(&self) -> &[TestSection] {
        &self.sections
    }

    pub fn structure(&self) -> &TestStructure {
        &self.structure
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }

    pub fn item_index(&self) -> usize {
        self.item_index
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn current_section(&self) -> &TestSection {
        &self.sections[self.section_index]
    }

    /// 某个部分的全部导航项
    pub fn items_of(&self, section_type: SectionType) -> Vec<SectionItem<'_>> {
        let s = &self.structure;
        match section_type {
            SectionType::Listening => s.listening_parts.iter().map(SectionItem::Part).collect(),
            SectionType::Reading => s.reading_passages.iter().map(SectionItem::Passage).collect(),
            SectionType::Writing => s.writing_tasks.iter().map(SectionItem::Writing).collect(),
            SectionType::Speaking => s.speaking_tasks.iter().map(SectionItem::Speaking).collect(),
        }
    }

    pub fn items(&self) -> Vec<SectionItem<'_>> {
        self.items_of(self.current_section().section_type)
    }

    pub fn current_item(&self) -> Option<SectionItem<'_>> {
        self.items().get(self.item_index).copied()
    }

    /// 某个听力 Part 或阅读文章下的题目，按 order 排序
    pub fn questions_for(&self, item: SectionItem<'_>) -> Vec<&Question> {
        let mut questions: Vec<&Question> = match item {
            SectionItem::Part(p) => self
                .structure
                .listening_questions
                .iter()
                .filter(|q| q.part_id == Some(p.id))
                .collect(),
            SectionItem::Passage(p) => self
                .structure
                .reading_questions
                .iter()
                .filter(|q| q.passage_id == Some(p.id))
                .collect(),
            SectionItem::Writing(_) | SectionItem::Speaking(_) => Vec::new(),
        };
        questions.sort_by_key(|q| q.order);
        questions
    }

    pub fn current_questions(&self) -> Vec<&Question> {
        self.current_item().map(|item| self.questions_for(item)).unwrap_or_default()
    }

    pub fn is_last_item(&self) -> bool {
        self.item_index + 1 >= self.items().len()
    }

    /// 口语部分不允许回到上一题
    pub fn can_go_previous(&self) -> bool {
        self.item_index > 0 && self.current_section().section_type != SectionType::Speaking
    }

    pub fn next(&mut self) -> bool {
        if self.is_last_item() {
            return false;
        }
        self.item_index += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if !self.can_go_previous() {
            return false;
        }
        self.item_index -= 1;
        true
    }

    /// 结束当前部分
    pub fn finish_section(&mut self) -> FinishOutcome {
        if self.section_index + 1 >= self.sections.len() {
            info!("🏁 最后一个部分已结束，准备交卷");
            return FinishOutcome::Submit;
        }
        self.section_index += 1;
        self.item_index = 0;
        info!(
            "➡️  进入第 {} 部分: {}",
            self.section_index + 1,
            self.current_section().section_type
        );
        FinishOutcome::Advanced(self.section_index)
    }

    /// 倒计时结束，强制结束当前部分
    pub fn time_up(&mut self) -> FinishOutcome {
        info!("⏰ {} 时间到", self.current_section().section_type);
        self.finish_section()
    }

    pub fn set_answer(&mut self, key: AnswerKey, value: AnswerValue) -> Result<(), AttemptError> {
        if self.submitted {
            return Err(AttemptError::AlreadySubmitted);
        }
        self.answers.insert(key, value);
        Ok(())
    }

    pub fn answer(&self, key: AnswerKey) -> Option<&AnswerValue> {
        self.answers.get(&key)
    }

    pub fn answers(&self) -> &BTreeMap<AnswerKey, AnswerValue> {
        &self.answers
    }

    pub fn find_question(&self, question_id: i64) -> Option<&Question> {
        self.structure
            .listening_questions
            .iter()
            .chain(self.structure.reading_questions.iter())
            .find(|q| q.id == question_id)
    }

    /// 通过渲染器应用一次输入
    pub fn respond(&mut self, question_id: i64, response: Response) -> Result<&AnswerValue, AttemptError> {
        if self.submitted {
            return Err(AttemptError::AlreadySubmitted);
        }
        let question = self
            .find_question(question_id)
            .ok_or(AttemptError::UnknownQuestion(question_id))?;
        let key = AnswerKey::Question(question_id);
        let value = renderers::respond(question, self.answers.get(&key), response)?;
        let slot = self.answers.entry(key).or_insert(AnswerValue::Text(String::new()));
        *slot = value;
        Ok(slot)
    }

    /// 填写写作任务
    pub fn write(&mut self, task_id: i64, text: impl Into<String>) -> Result<(), AttemptError> {
        if !self.structure.writing_tasks.iter().any(|t| t.id == task_id) {
            return Err(AttemptError::UnknownWritingTask(task_id));
        }
        self.set_answer(AnswerKey::Writing(task_id), AnswerValue::Text(text.into()))
    }

    pub fn writing_word_count(&self, task_id: i64) -> usize {
        self.answer(AnswerKey::Writing(task_id))
            .map(|a| word_count(a.as_text()))
            .unwrap_or(0)
    }

    /// 字数是否低于任务要求的最少字数
    pub fn below_minimum(&self, task_id: i64) -> bool {
        self.structure
            .writing_tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| self.writing_word_count(task_id) < t.word_limit_min as usize)
            .unwrap_or(false)
    }

    /// 生成交卷请求体
    ///
    /// 题目 ID 先在听力题中查找，再在阅读题中查找；都找不到的作答被丢弃。
    pub fn build_submission(&self) -> SubmissionPayload {
        let mut payload = SubmissionPayload::default();
        for (key, value) in &self.answers {
            match *key {
                AnswerKey::Writing(task_id) => payload.writing_answers.push(WritingAnswer {
                    task_id,
                    response_text: value.to_submission_string(),
                }),
                AnswerKey::Question(question_id) => {
                    let answer = QuestionAnswer {
                        question_id,
                        user_answer: value.to_submission_string(),
                    };
                    let s = &self.structure;
                    if s.listening_questions.iter().any(|q| q.id == question_id) {
                        payload.listening_answers.push(answer);
                    } else if s.reading_questions.iter().any(|q| q.id == question_id) {
                        payload.reading_answers.push(answer);
                    } else {
                        debug!("丢弃未知题目 {} 的作答", question_id);
                    }
                }
            }
        }
        payload
    }

    /// 交卷成功后锁定作答
    pub fn mark_submitted(&mut self) {
        self.submitted = true;
    }
}
