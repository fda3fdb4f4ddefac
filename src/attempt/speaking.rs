//! 口语答题流程
//!
//! `Idle → Preparing → Recording → Uploading → Completed`，
//! 除下面列出的转换外一律拒绝。

use tracing::{info, warn};

use crate::attempt::countdown::Countdown;
use crate::error::SpeakingError;
use crate::models::test::SpeakingTask;

/// 没有配置准备时间时的默认值（秒）
pub const DEFAULT_PREPARATION_SECONDS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakingState {
    Idle,
    Preparing,
    Recording,
    Uploading,
    /// 上传失败时带错误信息
    Completed { upload_error: Option<String> },
}

impl SpeakingState {
    pub fn name(&self) -> &'static str {
        match self {
            SpeakingState::Idle => "idle",
            SpeakingState::Preparing => "preparing",
            SpeakingState::Recording => "recording",
            SpeakingState::Uploading => "uploading",
            SpeakingState::Completed { .. } => "completed",
        }
    }
}

/// 单个口语任务的流程
#[derive(Debug, Clone)]
pub struct SpeakingFlow {
    task_id: i64,
    preparation_seconds: u32,
    speaking_seconds: u32,
    state: SpeakingState,
    countdown: Option<Countdown>,
    audio_url: Option<String>,
}

impl SpeakingFlow {
    pub fn new(task: &SpeakingTask) -> Self {
        Self {
            task_id: task.id,
            preparation_seconds: task.preparation_time_seconds.unwrap_or(DEFAULT_PREPARATION_SECONDS),
            speaking_seconds: task.speaking_time_seconds,
            state: SpeakingState::Idle,
            countdown: None,
            audio_url: None,
        }
    }

    pub fn task_id(&self) -> i64 {
        self.task_id
    }

    pub fn state(&self) -> &SpeakingState {
        &self.state
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    fn illegal(&self, event: &'static str) -> SpeakingError {
        SpeakingError::IllegalTransition {
            from: self.state.name(),
            event,
        }
    }

    fn enter(&mut self, state: SpeakingState, seconds: Option<u32>) {
        self.countdown = seconds.map(|s| Countdown::new(u64::from(s)));
        self.state = state;
    }

    pub fn start_preparation(&mut self) -> Result<(), SpeakingError> {
        if self.state != SpeakingState::Idle {
            return Err(self.illegal("start_preparation"));
        }
        info!("🗒️  口语任务 {} 准备 {} 秒", self.task_id, self.preparation_seconds);
        self.enter(SpeakingState::Preparing, Some(self.preparation_seconds));
        Ok(())
    }

    pub fn skip_preparation(&mut self) -> Result<(), SpeakingError> {
        if self.state != SpeakingState::Preparing {
            return Err(self.illegal("skip_preparation"));
        }
        self.begin_recording();
        Ok(())
    }

    fn begin_recording(&mut self) {
        info!("🎙️  口语任务 {} 开始录音 {} 秒", self.task_id, self.speaking_seconds);
        self.enter(SpeakingState::Recording, Some(self.speaking_seconds));
    }

    pub fn stop_recording(&mut self) -> Result<(), SpeakingError> {
        if self.state != SpeakingState::Recording {
            return Err(self.illegal("stop_recording"));
        }
        self.enter(SpeakingState::Uploading, None);
        Ok(())
    }

    /// 上传结束，成功时记录音频地址
    pub fn finish_upload(&mut self, result: Result<String, String>) -> Result<(), SpeakingError> {
        if self.state != SpeakingState::Uploading {
            return Err(self.illegal("finish_upload"));
        }
        let upload_error = match result {
            Ok(url) => {
                info!("✅ 口语任务 {} 录音已上传", self.task_id);
                self.audio_url = Some(url);
                None
            }
            Err(e) => {
                warn!("⚠️  口语任务 {} 录音上传失败: {}", self.task_id, e);
                Some(e)
            }
        };
        self.enter(SpeakingState::Completed { upload_error }, None);
        Ok(())
    }

    /// 走一秒；倒计时到期时自动进入下一阶段，返回是否发生了阶段切换
    pub fn tick(&mut self) -> bool {
        let expired = self.countdown.as_mut().map(Countdown::tick).unwrap_or(false);
        if !expired {
            return false;
        }
        match self.state {
            SpeakingState::Preparing => self.begin_recording(),
            SpeakingState::Recording => self.enter(SpeakingState::Uploading, None),
            _ => return false,
        }
        true
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, SpeakingState::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(prep: Option<u32>, speak: u32) -> SpeakingTask {
        SpeakingTask {
            id: 9,
            section_id: 4,
            part_number: 2,
            task_type: "cue_card".into(),
            prompt_text: "Describe a place".into(),
            preparation_time_seconds: prep,
            speaking_time_seconds: speak,
            order: 1,
            cue_card_points: None,
            instructions: None,
        }
    }

    #[test]
    fn happy_path_with_skip() {
        let mut flow = SpeakingFlow::new(&task(Some(60), 120));
        flow.start_preparation().unwrap();
        assert_eq!(flow.countdown().map(Countdown::remaining), Some(60));
        flow.skip_preparation().unwrap();
        assert_eq!(flow.state(), &SpeakingState::Recording);
        assert_eq!(flow.countdown().map(Countdown::remaining), Some(120));
        flow.stop_recording().unwrap();
        flow.finish_upload(Ok("/uploads/a.webm".into())).unwrap();
        assert_eq!(flow.state(), &SpeakingState::Completed { upload_error: None });
        assert_eq!(flow.audio_url(), Some("/uploads/a.webm"));
    }

    #[test]
    fn countdowns_drive_the_phases() {
        let mut flow = SpeakingFlow::new(&task(None, 2));
        flow.start_preparation().unwrap();
        assert_eq!(flow.countdown().map(Countdown::remaining), Some(10));
        let switched = (0..10).filter(|_| flow.tick()).count();
        assert_eq!(switched, 1);
        assert_eq!(flow.state(), &SpeakingState::Recording);
        assert!(!flow.tick());
        assert!(flow.tick());
        assert_eq!(flow.state(), &SpeakingState::Uploading);
        assert!(!flow.tick());
    }

    #[test]
    fn other_transitions_are_rejected() {
        let mut flow = SpeakingFlow::new(&task(Some(5), 5));
        assert_eq!(
            flow.stop_recording(),
            Err(SpeakingError::IllegalTransition { from: "idle", event: "stop_recording" })
        );
        flow.start_preparation().unwrap();
        assert!(flow.start_preparation().is_err());
        assert!(flow.finish_upload(Ok("x".into())).is_err());
    }

    #[test]
    fn failed_upload_is_kept_on_completion() {
        let mut flow = SpeakingFlow::new(&task(Some(1), 1));
        flow.start_preparation().unwrap();
        flow.skip_preparation().unwrap();
        flow.stop_recording().unwrap();
        flow.finish_upload(Err("413".into())).unwrap();
        assert!(flow.is_completed());
        assert_eq!(flow.state(), &SpeakingState::Completed { upload_error: Some("413".into()) });
        assert!(flow.audio_url().is_none());
    }
}
