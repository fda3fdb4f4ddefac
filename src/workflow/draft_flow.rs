//! 题目草稿处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整创作流程
//!
//! 流程顺序：
//! 1. 上传草稿引用的本地图片（标注题）
//! 2. 编辑器生成提交数据 → 校验
//! 3. 创建题目
//! 4. warn.txt（兜底）
//!
//! 写作/口语任务没有编辑器环节，直接交给创作服务创建。

use anyhow::Result;
use tracing::{info, warn};

use crate::clients::UploadKind;
use crate::config::Config;
use crate::models::sheet::{QuestionDraft, SpeakingTaskDraft, WritingTaskDraft};
use crate::services::authoring::{build_commit, to_create};
use crate::services::{AuthoringService, WarnWriter};
use crate::utils::truncate_text;
use crate::workflow::draft_ctx::DraftCtx;

/// 题目处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// 创建成功
    Success,
    /// 跳过（草稿无效或创建失败，已写入 warn.txt）
    Skipped,
}

/// 题目草稿处理流程
///
/// - 编排单道题的创作流程
/// - 决定何时上传、何时校验、何时兜底
/// - 只依赖业务能力（services）
pub struct DraftFlow {
    authoring: AuthoringService,
    warn_writer: WarnWriter,
    verbose_logging: bool,
}

impl DraftFlow {
    pub fn new(authoring: AuthoringService, config: &Config) -> Self {
        Self {
            authoring,
            warn_writer: WarnWriter::with_path(config.warn_file.clone()),
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(&self, draft: &QuestionDraft, ctx: &DraftCtx) -> Result<ProcessResult> {
        info!(
            "[文件 {}] {} {}: {}",
            ctx.file_index,
            ctx,
            draft.question_type,
            truncate_text(&draft.question_text, 60)
        );

        // ========== 流程 1: 上传图片 ==========
        let image_url = match self.resolve_image(draft, ctx).await {
            Ok(url) => url,
            Err(e) => return self.skip(ctx, &format!("图片上传失败: {:#}", e)).await,
        };

        // ========== 流程 2: 生成并校验提交数据 ==========
        let commit = match build_commit(draft, image_url.as_deref()) {
            Ok(commit) => commit,
            Err(e) => return self.skip(ctx, &e.to_string()).await,
        };
        if self.verbose_logging {
            info!("[文件 {}] type_specific_data = {}", ctx.file_index, commit.type_specific_data);
        }

        // ========== 流程 3: 创建题目 ==========
        let create = to_create(ctx.section_id, ctx.container, draft, commit, image_url);
        match self.authoring.create_question(ctx.container, &create).await {
            Ok(question) => {
                info!("[文件 {}] ✓ {} 已创建 (ID {})", ctx.file_index, ctx, question.id);
                Ok(ProcessResult::Success)
            }
            Err(e) => self.skip(ctx, &format!("创建失败: {}", e)).await,
        }
    }

    /// 创建一道写作任务
    pub async fn run_writing(&self, draft: &WritingTaskDraft, ctx: &DraftCtx) -> Result<ProcessResult> {
        info!(
            "[文件 {}] {} 写作 Task {}: {}",
            ctx.file_index,
            ctx,
            draft.task_number,
            truncate_text(&draft.prompt_text, 60)
        );
        match self
            .authoring
            .create_writing_task(ctx.section_id, draft, &ctx.base_dir)
            .await
        {
            Ok(task) => {
                info!("[文件 {}] ✓ {} 已创建 (ID {})", ctx.file_index, ctx, task.id);
                Ok(ProcessResult::Success)
            }
            Err(e) => self.skip(ctx, &format!("写作任务创建失败: {}", e)).await,
        }
    }

    /// 创建一道口语任务
    pub async fn run_speaking(&self, draft: &SpeakingTaskDraft, ctx: &DraftCtx) -> Result<ProcessResult> {
        info!(
            "[文件 {}] {} 口语 Part {}: {}",
            ctx.file_index,
            ctx,
            draft.part_number,
            truncate_text(&draft.prompt_text, 60)
        );
        match self.authoring.create_speaking_task(ctx.section_id, draft).await {
            Ok(task) => {
                info!("[文件 {}] ✓ {} 已创建 (ID {})", ctx.file_index, ctx, task.id);
                Ok(ProcessResult::Success)
            }
            Err(e) => self.skip(ctx, &format!("口语任务创建失败: {}", e)).await,
        }
    }

    /// 标注题的图片：已有地址直接使用，否则上传本地文件
    async fn resolve_image(&self, draft: &QuestionDraft, ctx: &DraftCtx) -> Result<Option<String>> {
        let Some(diagram) = &draft.diagram else {
            return Ok(None);
        };
        match (&diagram.image_url, &diagram.image_file) {
            (Some(url), _) => Ok(Some(url.clone())),
            (None, Some(file)) => {
                let url = self
                    .authoring
                    .upload_media(UploadKind::Image, &ctx.base_dir, file)
                    .await?;
                Ok(Some(url))
            }
            (None, None) => Ok(None),
        }
    }

    /// 写入失败记录并跳过
    async fn skip(&self, ctx: &DraftCtx, reason: &str) -> Result<ProcessResult> {
        warn!("[文件 {}] ⚠️ {} 跳过: {}", ctx.file_index, ctx, reason);
        self.warn_writer.write(&ctx.to_string(), reason).await?;
        Ok(ProcessResult::Skipped)
    }
}
