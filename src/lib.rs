//! # IELTS Exam Client
//!
//! 雅思模考平台的 Rust 客户端：作者端题目编辑器、学生端题目渲染与作答流程、
//! 教师评分，以及按 TOML 文件批量运行的命令行入口
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 持有 HTTP 客户端与登录会话，只暴露接口调用能力
//! - `ApiClient` - 所有后端接口，请求自动带上 Bearer 令牌
//! - `session/` - 显式传递的 `Session` 与按角色放行的 `RouteGuard`
//!
//! ### ② 业务能力层（Services）
//! - `editors/` - 每种题型的编辑器，草稿 → `commit()`
//! - `renderers/` - 每种题型的学生端视图与作答输入
//! - `checking/` - 本地判分与保存前校验
//! - `attempt/` - 作答导航、倒计时、口语录音状态机
//! - `services/` - 题目创作、教师评分、warn.txt
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整创作流程
//! - `DraftCtx` - 上下文封装（题组 + 题号 + 所属 Part/文章）
//! - `DraftFlow` - 流程编排（上传 → 编辑器 → 校验 → 创建 → warn）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文件处理器，管理登录和并发
//! - `orchestrator/file_processor` - 单个文件处理器（题组 / 答题卡 / 评分表）
//!
//! ## 模块结构

pub mod attempt;
pub mod checking;
pub mod clients;
pub mod config;
pub mod editors;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod renderers;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use attempt::{AttemptRunner, AttemptSession};
pub use checking::{check_answer, CheckOutcome};
pub use clients::ApiClient;
pub use config::{Config, RunMode};
pub use editors::{EditorCommit, QuestionEditor};
pub use error::{AppError, Result};
pub use models::question::Question;
pub use models::QuestionFamily;
pub use orchestrator::App;
pub use session::{RouteGuard, Session, SharedSession};
pub use workflow::{DraftCtx, DraftFlow, ProcessResult};
