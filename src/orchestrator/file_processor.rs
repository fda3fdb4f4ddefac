//! 单个文件处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个 TOML 文件，是文件级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **题组文件**：创建 Part/文章，再逐题（或逐个写作/口语任务）委托 `DraftFlow`
//! 2. **答题卡**：委托 `AttemptRunner` 完成整场作答
//! 3. **评分表**：委托 `GradingService` 提交评分
//! 4. **文件清理**：全部成功后删除已处理的 TOML 文件，部分失败时写回未完成的条目
//! 5. **统计输出**：记录成功/跳过数量

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::attempt::{AttemptRunner, FileAudioSource};
use crate::clients::ApiClient;
use crate::config::Config;
use crate::models::sheet::{QuestionDraft, SpeakingTaskDraft, TomlDocument, WritingTaskDraft};
use crate::models::{save_toml_document, AnswerSheet, GradeSheet, QuestionSet};
use crate::services::{AuthoringService, Container, GradingService, WarnWriter};
use crate::workflow::{DraftCtx, DraftFlow, ProcessResult};

/// 题目处理统计
#[derive(Debug, Default)]
pub struct QuestionStats {
    pub processed: usize,
    pub skipped: usize,
}

/// 处理一个题组文件
///
/// 部分条目失败时，把失败的条目和已创建的容器 ID 写回原文件，
/// 修正后重跑只会补建这些条目。
///
/// # 返回
/// 全部条目创建成功时返回 `true`
pub async fn process_question_set(
    client: ApiClient,
    set: QuestionSet,
    file_index: usize,
    config: Config,
) -> Result<bool> {
    let total = set.entry_count();
    log_file_start(file_index, &set.name, total);

    let base_dir = base_dir_of(set.file_path.as_deref());
    let authoring = AuthoringService::new(client);
    let container = authoring
        .create_container(&set, &base_dir)
        .await
        .with_context(|| format!("题组 {} 无法创建 {}", set.name, set.section_type.item_noun()))?;

    // 创建流程对象（只创建一次，复用）
    let flow = DraftFlow::new(authoring, &config);
    let mut stats = QuestionStats::default();
    let mut failed = FailedDrafts::default();
    let ctx_for = |number: u32| {
        DraftCtx::new(set.name.clone(), file_index, number, set.section_id, container, base_dir.clone())
    };
    let mut position = 0;

    for draft in &set.questions {
        position += 1;
        log_question_start(file_index, position, total);
        let outcome = flow.run(draft, &ctx_for(draft.question_number)).await;
        if !stats.record(outcome, file_index, draft.question_number) {
            failed.questions.push(draft.clone());
        }
    }
    for task in &set.writing_tasks {
        position += 1;
        log_question_start(file_index, position, total);
        let outcome = flow.run_writing(task, &ctx_for(task.task_number)).await;
        if !stats.record(outcome, file_index, task.task_number) {
            failed.writing_tasks.push(task.clone());
        }
    }
    for task in &set.speaking_tasks {
        position += 1;
        log_question_start(file_index, position, total);
        let outcome = flow.run_speaking(task, &ctx_for(task.part_number)).await;
        if !stats.record(outcome, file_index, task.part_number) {
            failed.speaking_tasks.push(task.clone());
        }
    }

    log_file_complete(file_index, &stats, total);

    let all_done = stats.skipped == 0;
    if all_done {
        cleanup_file(set.file_path.as_deref(), file_index).await?;
    } else if let Some(path) = set.file_path.as_deref() {
        let remaining = remaining_set(&set, container, failed);
        save_toml_document(Path::new(path), &remaining).await?;
        info!(
            "[文件 {}] 📝 已写回 {} 个未完成条目，修正后可直接重跑",
            file_index,
            remaining.entry_count()
        );
    }
    Ok(all_done)
}

/// 创建失败、需要保留在文件中的条目
#[derive(Debug, Default)]
struct FailedDrafts {
    questions: Vec<QuestionDraft>,
    writing_tasks: Vec<WritingTaskDraft>,
    speaking_tasks: Vec<SpeakingTaskDraft>,
}

/// 只保留失败条目，并记下已创建的容器
fn remaining_set(set: &QuestionSet, container: Container, failed: FailedDrafts) -> QuestionSet {
    QuestionSet {
        container_id: container.created_id().or(set.container_id),
        questions: failed.questions,
        writing_tasks: failed.writing_tasks,
        speaking_tasks: failed.speaking_tasks,
        ..set.clone()
    }
}

impl QuestionStats {
    /// 计入一条结果，成功时返回 `true`
    fn record(&mut self, outcome: Result<ProcessResult>, file_index: usize, number: u32) -> bool {
        match outcome {
            Ok(ProcessResult::Success) => {
                self.processed += 1;
                true
            }
            Ok(ProcessResult::Skipped) => {
                self.skipped += 1;
                false
            }
            Err(e) => {
                error!("[文件 {}] 条目 {} 处理失败: {:#}", file_index, number, e);
                self.skipped += 1;
                false
            }
        }
    }
}

/// 按答题卡完成一次作答
pub async fn process_answer_sheet(
    client: ApiClient,
    sheet: AnswerSheet,
    file_index: usize,
    config: Config,
) -> Result<bool> {
    info!("[文件 {}] 开始作答试卷 {}", file_index, sheet.test_template_id);
    let source = FileAudioSource::new(&config.recordings_folder);
    let runner = AttemptRunner::new(&client, source, config.skip_speaking_preparation);

    let report = runner.run(&sheet).await?;
    info!(
        "[文件 {}] 作答 #{}: 填写 {}, 跳过 {}, 口语上传 {}/{}, 提交 {} 条",
        file_index,
        report.attempt_id,
        report.answered,
        report.skipped,
        report.speaking_uploaded,
        report.speaking_uploaded + report.speaking_failed,
        report.submitted_answers
    );
    if !report.timed_out.is_empty() {
        warn!("[文件 {}] ⏰ 超时结束的部分: {:?}", file_index, report.timed_out);
    }
    let all_done = report.skipped == 0 && report.speaking_failed == 0;
    if all_done {
        cleanup_file(sheet.file_path.as_deref(), file_index).await?;
    } else {
        let source = sheet.file_path.clone().unwrap_or_default();
        let reason = format!(
            "作答 #{} 有 {} 条作答被跳过, {} 个口语上传失败",
            report.attempt_id, report.skipped, report.speaking_failed
        );
        WarnWriter::with_path(config.warn_file.clone()).write(&source, &reason).await?;
    }
    Ok(all_done)
}

/// 提交一张评分表
pub async fn process_grade_sheet(
    client: ApiClient,
    sheet: GradeSheet,
    file_index: usize,
    config: Config,
) -> Result<bool> {
    let service = GradingService::new(client);
    let stats = service.apply_sheet(&sheet).await?;
    info!(
        "[文件 {}] 评分: 成功 {}, 拒绝 {}, 失败 {}, 共 {}",
        file_index,
        stats.graded,
        stats.rejected,
        stats.failed,
        stats.total()
    );
    if stats.rejected + stats.failed > 0 {
        let source = sheet.file_path.clone().unwrap_or_default();
        let reason = format!("{} 条评分被拒绝, {} 条提交失败", stats.rejected, stats.failed);
        WarnWriter::with_path(config.warn_file.clone()).write(&source, &reason).await?;
        return Ok(false);
    }
    cleanup_file(sheet.file_path.as_deref(), file_index).await?;
    Ok(true)
}

/// 草稿中相对路径的基准目录：TOML 文件所在目录
fn base_dir_of(file_path: Option<&str>) -> PathBuf {
    file_path
        .and_then(|p| Path::new(p).parent())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 清理已处理的文件
async fn cleanup_file(file_path: Option<&str>, file_index: usize) -> Result<()> {
    info!("[文件 {}] 🗑️ 清理已处理的文件...", file_index);

    let Some(file_path) = file_path else {
        warn!("[文件 {}] ⚠️ 文件路径未设置", file_index);
        return Ok(());
    };
    if Path::new(file_path).exists() {
        tokio::fs::remove_file(file_path)
            .await
            .with_context(|| format!("无法删除文件: {}", file_path))?;
        info!(
            "[文件 {}] ✓ 文件已删除: {}",
            file_index,
            Path::new(file_path)
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
        );
    } else {
        warn!("[文件 {}] ⚠️ 文件不存在: {}", file_index, file_path);
    }
    Ok(())
}

// ========== 日志辅助函数 ==========

fn log_file_start(file_index: usize, name: &str, entry_count: usize) {
    info!("[文件 {}] 开始处理", file_index);
    info!("[文件 {}] 题组: {}", file_index, name);
    info!("[文件 {}] 条目总数: {}", file_index, entry_count);
}

fn log_question_start(file_index: usize, question_index: usize, total: usize) {
    info!("\n[文件 {}] {}", file_index, "─".repeat(30));
    info!("[文件 {}] 处理第 {}/{} 个条目", file_index, question_index, total);
}

fn log_file_complete(file_index: usize, stats: &QuestionStats, total: usize) {
    info!(
        "[文件 {}] 题目统计: 成功 {}, 跳过 {}, 总计 {}",
        file_index, stats.processed, stats.skipped, total
    );
    info!("\n[文件 {}] ✅ 题组处理完成\n", file_index);
}
