//! 按答题卡完成一次考试作答
//!
//! 每个部分在自己的倒计时内作答；倒计时先到期时强制结束该部分，
//! 已填写的作答保留。最后一个部分结束后一次性交卷。

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::attempt::countdown::{format_clock, CountdownTask, Tick};
use crate::attempt::navigator::{AttemptSession, FinishOutcome, SectionItem};
use crate::attempt::recorder::{AudioSource, Microphone};
use crate::attempt::speaking::{SpeakingFlow, SpeakingState};
use crate::clients::ApiClient;
use crate::error::ApiError;
use crate::models::test::{SpeakingTask, SpeakingUploadResponse, TestAttempt};
use crate::models::{
    AnswerSheet, AnswerValue, Question, QuestionFamily, SectionType, SubmissionPayload, TestAttemptWithDetails,
};
use crate::renderers::Response;

/// 作答过程用到的后端接口
pub trait AttemptApi: Send + Sync {
    fn start_attempt(&self, template_id: i64) -> impl Future<Output = Result<TestAttempt, ApiError>> + Send;

    fn get_attempt(&self, attempt_id: i64) -> impl Future<Output = Result<TestAttemptWithDetails, ApiError>> + Send;

    fn submit_attempt(
        &self,
        attempt_id: i64,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<TestAttempt, ApiError>> + Send;

    fn upload_speaking(
        &self,
        attempt_id: i64,
        task_id: i64,
        audio: Vec<u8>,
    ) -> impl Future<Output = Result<SpeakingUploadResponse, ApiError>> + Send;
}

impl AttemptApi for ApiClient {
    async fn start_attempt(&self, template_id: i64) -> Result<TestAttempt, ApiError> {
        ApiClient::start_attempt(self, template_id).await
    }

    async fn get_attempt(&self, attempt_id: i64) -> Result<TestAttemptWithDetails, ApiError> {
        ApiClient::get_attempt(self, attempt_id).await
    }

    async fn submit_attempt(&self, attempt_id: i64, payload: &SubmissionPayload) -> Result<TestAttempt, ApiError> {
        ApiClient::submit_attempt(self, attempt_id, payload).await
    }

    async fn upload_speaking(
        &self,
        attempt_id: i64,
        task_id: i64,
        audio: Vec<u8>,
    ) -> Result<SpeakingUploadResponse, ApiError> {
        ApiClient::upload_speaking(self, attempt_id, task_id, audio).await
    }
}

/// 一个部分的填写统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionFill {
    pub answered: usize,
    /// 答题卡中找不到对应题目或输入无效的条目
    pub skipped: usize,
}

impl SectionFill {
    fn merge(&mut self, other: SectionFill) {
        self.answered += other.answered;
        self.skipped += other.skipped;
    }
}

/// 一次作答的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptReport {
    pub attempt_id: i64,
    pub answered: usize,
    pub skipped: usize,
    pub speaking_uploaded: usize,
    pub speaking_failed: usize,
    /// 因时间到而结束的部分
    pub timed_out: Vec<SectionType>,
    pub submitted_answers: usize,
}

/// 把答题卡中的值拆成渲染器能接受的输入序列
pub fn responses_for(question: &Question, value: &AnswerValue) -> Vec<Response> {
    match value {
        AnswerValue::Slots(map) => map.iter().map(|(k, v)| Response::fill(k.clone(), v.clone())).collect(),
        AnswerValue::Text(text) if question.family() == QuestionFamily::MultipleChoice => {
            vec![Response::Select(text.clone())]
        }
        AnswerValue::Text(text) => vec![Response::Text(text.clone())],
        other => other.selected_labels().into_iter().map(Response::Select).collect(),
    }
}

fn fill_question(session: &mut AttemptSession, question: &Question, value: &AnswerValue) -> bool {
    for response in responses_for(question, value) {
        if let Err(e) = session.respond(question.id, response) {
            warn!("⚠️  题目 {} 作答无效: {}", question.question_number, e);
            return false;
        }
    }
    true
}

/// 用答题卡填写当前部分（听力、阅读或写作），逐项向后导航
pub fn fill_current_section(session: &mut AttemptSession, sheet: &AnswerSheet) -> SectionFill {
    let section_type = session.current_section().section_type;
    let mut fill = SectionFill::default();
    let mut used: BTreeSet<String> = BTreeSet::new();

    let entries = match section_type {
        SectionType::Listening => &sheet.listening,
        SectionType::Reading => &sheet.reading,
        SectionType::Writing => {
            loop {
                if let Some(SectionItem::Writing(task)) = session.current_item() {
                    let (task_id, key) = (task.id, task.task_number.to_string());
                    if let Some(text) = sheet.writing.get(&key) {
                        used.insert(key);
                        match session.write(task_id, text.clone()) {
                            Ok(()) => fill.answered += 1,
                            Err(e) => warn!("⚠️  写作任务 {} 无法作答: {}", task_id, e),
                        }
                        if session.below_minimum(task_id) {
                            warn!(
                                "✍️  写作任务 {} 只有 {} 词，低于最少字数",
                                task_id,
                                session.writing_word_count(task_id)
                            );
                        }
                    }
                }
                if !session.next() {
                    break;
                }
            }
            fill.skipped = sheet.writing.keys().filter(|k| !used.contains(*k)).count();
            return fill;
        }
        SectionType::Speaking => return fill,
    };

    loop {
        let questions: Vec<Question> = session.current_questions().into_iter().cloned().collect();
        for question in &questions {
            let key = question.question_number.to_string();
            let Some(value) = entries.get(&key) else {
                continue;
            };
            used.insert(key);
            if fill_question(session, question, value) {
                fill.answered += 1;
            } else {
                fill.skipped += 1;
            }
        }
        if !session.next() {
            break;
        }
    }

    let unknown = entries.keys().filter(|k| !used.contains(*k)).count();
    if unknown > 0 {
        warn!("⚠️  {} 部分有 {} 个题号不在试卷中", section_type, unknown);
    }
    fill.skipped += unknown;
    fill
}

/// 考试作答执行器
pub struct AttemptRunner<'a, C: AttemptApi, S: AudioSource> {
    client: &'a C,
    source: S,
    microphone: Microphone,
    skip_preparation: bool,
    tick_period: Duration,
}

impl<'a, C: AttemptApi, S: AudioSource> AttemptRunner<'a, C, S> {
    pub fn new(client: &'a C, source: S, skip_preparation: bool) -> Self {
        Self {
            client,
            source,
            microphone: Microphone::new(),
            skip_preparation,
            tick_period: Duration::from_secs(1),
        }
    }

    /// 倒计时每走一秒的实际间隔，默认 1 秒
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// 开始作答、逐部分填写并交卷
    pub async fn run(&self, sheet: &AnswerSheet) -> Result<AttemptReport> {
        let attempt = self
            .client
            .start_attempt(sheet.test_template_id)
            .await
            .with_context(|| format!("无法开始试卷 {} 的作答", sheet.test_template_id))?;
        let details = self
            .client
            .get_attempt(attempt.id)
            .await
            .with_context(|| format!("无法获取作答 {} 的内容", attempt.id))?;
        let mut session = AttemptSession::new(details)?;
        info!("📝 开始作答 #{}: {}", session.attempt_id(), session.title());

        let mut report = AttemptReport {
            attempt_id: session.attempt_id(),
            ..Default::default()
        };

        loop {
            let section = session.current_section().clone();
            let duration = section.duration_seconds();
            info!(
                "⏱️  {} 部分开始，共 {} 个{}，限时 {}",
                section.section_type,
                session.items().len(),
                section.section_type.item_noun(),
                format_clock(duration)
            );

            let (timer, mut ticks) = CountdownTask::spawn(duration, self.tick_period);
            let mut fill = SectionFill::default();
            let timed_out = tokio::select! {
                _ = self.answer_section(&mut session, sheet, &mut fill, &mut report) => false,
                _ = wait_for_expiry(&mut ticks) => true,
            };
            timer.stop();
            report.answered += fill.answered;
            report.skipped += fill.skipped;

            let outcome = if timed_out {
                report.timed_out.push(section.section_type);
                session.time_up()
            } else {
                session.finish_section()
            };
            if outcome == FinishOutcome::Submit {
                break;
            }
        }

        let payload = session.build_submission();
        report.submitted_answers = payload.total_answers();
        info!("📨 交卷: {} 条作答", report.submitted_answers);
        self.client
            .submit_attempt(session.attempt_id(), &payload)
            .await
            .with_context(|| format!("作答 {} 交卷失败", session.attempt_id()))?;
        session.mark_submitted();
        Ok(report)
    }

    async fn answer_section(
        &self,
        session: &mut AttemptSession,
        sheet: &AnswerSheet,
        fill: &mut SectionFill,
        report: &mut AttemptReport,
    ) {
        if session.current_section().section_type != SectionType::Speaking {
            fill.merge(fill_current_section(session, sheet));
            return;
        }

        loop {
            if let Some(SectionItem::Speaking(task)) = session.current_item() {
                let task = task.clone();
                if let Some(file) = sheet.speaking.get(&task.order.to_string()) {
                    info!("🗣️  口语 Part {}，录音文件 {}", task.part_number, file);
                    match self.speak(session.attempt_id(), &task, file).await {
                        SpeakingState::Completed { upload_error: None } => report.speaking_uploaded += 1,
                        _ => report.speaking_failed += 1,
                    }
                }
            }
            if !session.next() {
                break;
            }
        }
    }

    /// 完成一个口语任务，返回最终状态
    async fn speak(&self, attempt_id: i64, task: &SpeakingTask, clip: &str) -> SpeakingState {
        let mut flow = SpeakingFlow::new(task);
        if let Err(e) = self.drive_speaking(attempt_id, &mut flow, clip).await {
            error!("❌ 口语任务 {} 中断: {}", task.id, e);
        }
        flow.state().clone()
    }

    async fn drive_speaking(&self, attempt_id: i64, flow: &mut SpeakingFlow, clip: &str) -> Result<()> {
        flow.start_preparation()?;
        if self.skip_preparation {
            flow.skip_preparation()?;
        } else {
            let mut interval = tokio::time::interval(self.tick_period);
            interval.tick().await;
            while *flow.state() == SpeakingState::Preparing {
                interval.tick().await;
                flow.tick();
            }
        }

        let recording = self.microphone.start(flow.task_id(), Some(clip.to_string()))?;
        let captured = recording.stop(&self.source).await;
        flow.stop_recording()?;

        let result = match captured {
            Ok(audio) => self
                .client
                .upload_speaking(attempt_id, flow.task_id(), audio)
                .await
                .map(|r| r.audio_url)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        flow.finish_upload(result)?;
        Ok(())
    }
}

async fn wait_for_expiry(ticks: &mut tokio::sync::mpsc::Receiver<Tick>) {
    while let Some(tick) = ticks.recv().await {
        if tick == Tick::Expired {
            return;
        }
    }
    // 计时任务提前结束时永不到期
    std::future::pending::<()>().await
}
