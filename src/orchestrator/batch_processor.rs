//! 批量文件处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量文件的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、恢复会话、登录、按角色检查运行模式
//! 2. **批量加载**：扫描并加载当前模式对应的 TOML 文件
//! 3. **并发控制**：使用 Semaphore 限制并发数量
//! 4. **分批处理**：将文件分批次处理，每批完成后再开始下一批
//! 5. **全局统计**：汇总所有文件的处理结果

use anyhow::{bail, Context, Result};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::clients::ApiClient;
use crate::config::{Config, RunMode};
use crate::models::sheet::TomlDocument;
use crate::models::{load_all_toml_files, AnswerSheet, GradeSheet, QuestionSet, UserRole};
use crate::orchestrator::file_processor;
use crate::session::{Access, RouteGuard, Session};
use crate::utils::logging;

/// 运行模式允许的角色
pub fn allowed_roles(mode: RunMode) -> &'static [UserRole] {
    match mode {
        RunMode::Author | RunMode::Grade => &[UserRole::Teacher, UserRole::Admin],
        RunMode::Attempt => &[UserRole::Student],
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    client: ApiClient,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file, &format!("{} 模式运行日志", config.run_mode))?;
        logging::log_startup(&config.run_mode.to_string(), &config.api_base_url, config.max_concurrent);

        let session = Session::restore(&config.token_file).await?.into_shared();
        let client = ApiClient::new(&config, session.clone())?;
        sign_in(&client, &config).await?;

        let guard = RouteGuard::new(allowed_roles(config.run_mode));
        match guard.check(&*session.read().await) {
            Access::Granted => {}
            Access::RedirectToLogin => bail!("未登录，无法以 {} 模式运行", config.run_mode),
            Access::RedirectTo(dashboard) => {
                bail!("当前账号无权以 {} 模式运行（角色首页: {}）", config.run_mode, dashboard)
            }
        }

        Ok(Self { config, client })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let stats = match self.config.run_mode {
            RunMode::Author => {
                let docs = self.load::<QuestionSet>().await?;
                self.process_all(docs, file_processor::process_question_set).await?
            }
            RunMode::Attempt => {
                let docs = self.load::<AnswerSheet>().await?;
                self.process_all(docs, file_processor::process_answer_sheet).await?
            }
            RunMode::Grade => {
                let docs = self.load::<GradeSheet>().await?;
                self.process_all(docs, file_processor::process_grade_sheet).await?
            }
        };

        if let Some(stats) = stats {
            logging::print_final_stats(stats.success, stats.failed, stats.total, &self.config.output_log_file);
        }
        Ok(())
    }

    /// 加载当前模式的 TOML 文件
    async fn load<T: TomlDocument>(&self) -> Result<Vec<T>> {
        info!("\n📁 正在扫描 {} ...", self.config.toml_folder);
        load_all_toml_files(&self.config.toml_folder).await
    }

    /// 处理所有文件，没有文件时返回 `None`
    async fn process_all<T, F, Fut>(&self, docs: Vec<T>, handler: F) -> Result<Option<ProcessingStats>>
    where
        T: Send + 'static,
        F: Fn(ApiClient, T, usize, Config) -> Fut + Copy + Send + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        if docs.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML文件，程序结束");
            return Ok(None);
        }

        let max = self.config.max_concurrent;
        let total = docs.len();
        logging::log_files_loaded(total, max);

        let semaphore = Arc::new(Semaphore::new(max));
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };
        let total_batches = total.div_ceil(max);

        let mut docs = docs.into_iter();
        for batch_num in 1..=total_batches {
            let batch_start = (batch_num - 1) * max;
            let batch: Vec<T> = docs.by_ref().take(max).collect();
            logging::log_batch_start(batch_num, total_batches, batch_start + 1, batch_start + batch.len(), total);

            let result = self.process_batch(batch, batch_start, semaphore.clone(), handler).await?;
            stats.success += result.success;
            stats.failed += result.failed;

            logging::log_batch_complete(batch_num, result.success, result.success + result.failed);
        }

        Ok(Some(stats))
    }

    /// 处理单个批次
    async fn process_batch<T, F, Fut>(
        &self,
        batch: Vec<T>,
        batch_start: usize,
        semaphore: Arc<Semaphore>,
        handler: F,
    ) -> Result<BatchResult>
    where
        T: Send + 'static,
        F: Fn(ApiClient, T, usize, Config) -> Fut + Copy + Send + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        let mut handles = Vec::new();

        for (idx, doc) in batch.into_iter().enumerate() {
            let file_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let client = self.client.clone();
            let config = self.config.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                handler(client, doc, file_index, config).await
            });
            handles.push((file_index, handle));
        }

        let (indices, futures): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let mut result = BatchResult::default();
        for (file_index, outcome) in indices.into_iter().zip(join_all(futures).await) {
            match outcome {
                Ok(Ok(true)) => result.success += 1,
                Ok(Ok(false)) => result.failed += 1,
                Ok(Err(e)) => {
                    error!("[文件 {}] ❌ 处理过程中发生错误: {:#}", file_index, e);
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[文件 {}] 任务执行失败: {}", file_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 复用已保存的令牌；令牌失效或不存在时用配置中的账号登录
async fn sign_in(client: &ApiClient, config: &Config) -> Result<()> {
    let has_token = client.session().read().await.is_authenticated();
    if has_token {
        match client.me().await {
            Ok(user) => {
                info!("🔑 已恢复登录: {} ({})", user.email, user.role);
                return Ok(());
            }
            Err(e) => warn!("⚠️ 保存的令牌不可用: {}", e),
        }
    }

    let (email, password) = config
        .credentials()
        .context("没有可用的登录令牌，请配置 LOGIN_EMAIL 和 LOGIN_PASSWORD")?;
    let user = client.login(email, password).await.context("登录失败")?;
    info!("🔑 登录成功: {} ({})", user.email, user.role);
    Ok(())
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_mode_is_limited_to_its_roles() {
        assert_eq!(allowed_roles(RunMode::Attempt), &[UserRole::Student]);
        assert!(allowed_roles(RunMode::Author).contains(&UserRole::Admin));
        assert!(!allowed_roles(RunMode::Grade).contains(&UserRole::Student));
    }
}
