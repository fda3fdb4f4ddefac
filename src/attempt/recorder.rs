use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::SpeakingError;

/// 录音来源
pub trait AudioSource: Send + Sync {
    /// 取回某个口语任务的录音数据（webm），`clip` 为答题卡中指定的录音名
    fn capture(
        &self,
        task_id: i64,
        clip: Option<&str>,
    ) -> impl Future<Output = Result<Vec<u8>, SpeakingError>> + Send;
}

/// 从目录读取事先录好的文件
///
/// 指定了录音名时读取 `{folder}/{clip}`，否则读取 `{folder}/task_{id}.webm`。
#[derive(Debug, Clone)]
pub struct FileAudioSource {
    folder: PathBuf,
}

impl FileAudioSource {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self { folder: folder.into() }
    }

    pub fn path_for(&self, task_id: i64, clip: Option<&str>) -> PathBuf {
        match clip {
            Some(file) => self.folder.join(file),
            None => self.folder.join(format!("task_{}.webm", task_id)),
        }
    }
}

impl AudioSource for FileAudioSource {
    async fn capture(&self, task_id: i64, clip: Option<&str>) -> Result<Vec<u8>, SpeakingError> {
        let path = self.path_for(task_id, clip);
        debug!("读取录音文件 {}", path.display());
        tokio::fs::read(&path)
            .await
            .map_err(|e| SpeakingError::CaptureFailed(format!("{}: {}", path.display(), e)))
    }
}

/// 独占的麦克风
#[derive(Debug, Clone, Default)]
pub struct Microphone {
    lock: Arc<Mutex<()>>,
}

impl Microphone {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一次录音；麦克风正被使用时返回 `MicrophoneBusy`
    pub fn start(&self, task_id: i64, clip: Option<String>) -> Result<Recording, SpeakingError> {
        let guard = self
            .lock
            .clone()
            .try_lock_owned()
            .map_err(|_| SpeakingError::MicrophoneBusy)?;
        Ok(Recording {
            task_id,
            clip,
            _guard: guard,
        })
    }
}

/// 进行中的录音，停止或丢弃时释放麦克风
#[derive(Debug)]
pub struct Recording {
    task_id: i64,
    clip: Option<String>,
    _guard: OwnedMutexGuard<()>,
}

impl Recording {
    pub fn task_id(&self) -> i64 {
        self.task_id
    }

    pub async fn stop<S: AudioSource>(self, source: &S) -> Result<Vec<u8>, SpeakingError> {
        source.capture(self.task_id, self.clip.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silence;

    impl AudioSource for Silence {
        async fn capture(&self, _task_id: i64, _clip: Option<&str>) -> Result<Vec<u8>, SpeakingError> {
            Ok(vec![0x1a, 0x45, 0xdf, 0xa3])
        }
    }

    #[tokio::test]
    async fn microphone_is_exclusive_until_stop() {
        let mic = Microphone::new();
        let recording = mic.start(1, None).unwrap();
        assert_eq!(mic.start(2, None).unwrap_err(), SpeakingError::MicrophoneBusy);

        let bytes = recording.stop(&Silence).await.unwrap();
        assert_eq!(bytes.len(), 4);
        assert!(mic.start(2, None).is_ok());
    }

    #[test]
    fn dropping_a_recording_releases_the_microphone() {
        let mic = Microphone::new();
        drop(mic.start(1, None).unwrap());
        assert_eq!(mic.start(1, None).map(|r| r.task_id()), Ok(1));
    }

    #[test]
    fn named_clips_override_the_default_name() {
        let source = FileAudioSource::new("recordings");
        assert_eq!(source.path_for(3, Some("part2.webm")), PathBuf::from("recordings/part2.webm"));
        assert_eq!(source.path_for(4, None), PathBuf::from("recordings/task_4.webm"));
    }

    #[tokio::test]
    async fn missing_file_is_a_capture_failure() {
        let source = FileAudioSource::new(std::env::temp_dir().join("no_such_recordings_dir"));
        let err = source.capture(77, None).await.unwrap_err();
        assert!(matches!(err, SpeakingError::CaptureFailed(msg) if msg.contains("task_77.webm")));
    }
}
