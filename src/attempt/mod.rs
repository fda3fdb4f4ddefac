//! 学生作答
//!
//! - `navigator`：部分/项目导航、作答映射与交卷请求体
//! - `countdown`：部分倒计时
//! - `speaking`：口语准备、录音、上传状态机
//! - `recorder`：录音来源与独占麦克风
//! - `runner`：按答题卡完成整场作答

pub mod countdown;
pub mod navigator;
pub mod recorder;
pub mod runner;
pub mod speaking;

pub use countdown::{format_clock, Countdown, CountdownTask, Tick, Urgency};
pub use navigator::{AnswerKey, AttemptSession, FinishOutcome, SectionItem};
pub use recorder::{AudioSource, FileAudioSource, Microphone, Recording};
pub use runner::{AttemptApi, AttemptReport, AttemptRunner, SectionFill};
pub use speaking::{SpeakingFlow, SpeakingState};
