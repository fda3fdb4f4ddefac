use crate::models::sheet::TomlDocument;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载一个文档
pub async fn load_toml_document<T: TomlDocument>(toml_file_path: &Path) -> Result<T> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let mut doc: T = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    // 设置文件路径
    doc.set_file_path(toml_file_path.to_string_lossy().to_string());

    Ok(doc)
}

/// 把文档写回 TOML 文件（覆盖原内容）
pub async fn save_toml_document<T: serde::Serialize>(toml_file_path: &Path, doc: &T) -> Result<()> {
    let content = toml::to_string(doc)
        .with_context(|| format!("无法序列化TOML文件: {}", toml_file_path.display()))?;
    fs::write(toml_file_path, content)
        .await
        .with_context(|| format!("无法写入TOML文件: {}", toml_file_path.display()))?;
    Ok(())
}

/// 列出文件夹中的全部 TOML 文件（按文件名排序）
pub async fn list_toml_files(folder_path: &str) -> Result<Vec<PathBuf>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }

    toml_files.sort();
    Ok(toml_files)
}

/// 从文件夹中加载所有 TOML 文件
///
/// 单个文件解析失败只记录警告，不影响其它文件。
pub async fn load_all_toml_files<T: TomlDocument>(folder_path: &str) -> Result<Vec<T>> {
    let mut docs = Vec::new();

    for path in list_toml_files(folder_path).await? {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_toml_document::<T>(&path).await {
            Ok(doc) => {
                tracing::info!("成功加载 {} 个条目", doc.entry_count());
                docs.push(doc);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(docs)
}
