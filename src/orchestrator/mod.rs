//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文件处理器
//! - 管理应用生命周期（初始化、登录、运行）
//! - 按运行模式加载 TOML 文件
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `file_processor` - 单个文件处理器
//! - 题组文件：创建 Part/文章，逐题交给 DraftFlow
//! - 答题卡：交给 AttemptRunner 完成作答并交卷
//! - 评分表：交给 GradingService
//! - 清理已处理的文件
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<文件>)
//!     ↓
//! file_processor (处理单个文件)
//!     ↓
//! workflow::DraftFlow / attempt::AttemptRunner
//!     ↓
//! services (能力层：authoring / grading / warn)
//!     ↓
//! clients (基础设施：ApiClient + Session)
//! ```

pub mod batch_processor;
pub mod file_processor;

// 重新导出主要类型
pub use batch_processor::{allowed_roles, App};
pub use file_processor::{process_answer_sheet, process_grade_sheet, process_question_set, QuestionStats};
