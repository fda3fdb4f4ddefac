//! 失败记录服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 失败记录服务
///
/// 职责：
/// - 将无法处理的条目（题目草稿、答题卡、评分表）追加到 warn.txt
/// - 只处理单条记录
#[derive(Debug, Clone)]
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用默认文件 warn.txt
    pub fn new() -> Self {
        Self::with_path("warn.txt")
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 追加一条记录
    ///
    /// # 参数
    /// - `source`: 出错的位置（文件名 + 题号等）
    /// - `reason`: 失败原因
    pub async fn write(&self, source: &str, reason: &str) -> Result<()> {
        debug!("写入失败记录: {} | {}", source, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await
            .with_context(|| format!("无法打开失败记录文件: {}", self.warn_file_path))?;

        let line = format!(
            "[{}] {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            source,
            reason.replace('\n', " ")
        );
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let path = std::env::temp_dir().join(format!("ielts_warn_{}.txt", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;
        let writer = WarnWriter::with_path(path.to_string_lossy());

        writer.write("part1.toml 第 3 题", "空位 BLANK_2 缺少正确答案").await.unwrap();
        writer.write("part1.toml 第 4 题", "line\nbreak").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("part1.toml 第 3 题 | 空位 BLANK_2 缺少正确答案"));
        assert!(lines[1].ends_with("line break"));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
