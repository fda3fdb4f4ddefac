//! 登录会话
//!
//! 会话对象显式传给需要它的组件（API 客户端、路由守卫），
//! 令牌持久化在本地文件中，`clear()` 即登出。

pub mod guard;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::FileError;
use crate::models::User;

pub use guard::{Access, RouteGuard};

/// 在多个任务之间共享的会话
pub type SharedSession = Arc<RwLock<Session>>;

#[derive(Debug, Clone, Default)]
pub struct Session {
    token_file: PathBuf,
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    /// 空会话（不读取文件）
    pub fn new(token_file: impl Into<PathBuf>) -> Self {
        Self {
            token_file: token_file.into(),
            token: None,
            user: None,
        }
    }

    /// 从令牌文件恢复会话，文件不存在时返回未登录的会话
    pub async fn restore(token_file: impl Into<PathBuf>) -> Result<Self, FileError> {
        let mut session = Self::new(token_file);
        let path = session.token_file.clone();
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let token = content.trim();
                if !token.is_empty() {
                    debug!("🔑 从 {} 恢复登录令牌", path.display());
                    session.token = Some(token.to_string());
                }
                Ok(session)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(session),
            Err(e) => Err(FileError::read_failed(path.display().to_string(), e)),
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn token_file(&self) -> &Path {
        &self.token_file
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    /// 保存新令牌并写入文件
    pub async fn set_token(&mut self, token: impl Into<String>) -> Result<(), FileError> {
        let token = token.into();
        tokio::fs::write(&self.token_file, &token)
            .await
            .map_err(|e| FileError::write_failed(self.token_file.display().to_string(), e))?;
        self.token = Some(token);
        Ok(())
    }

    /// 登出：清除令牌、用户与令牌文件
    pub async fn clear(&mut self) {
        self.token = None;
        self.user = None;
        match tokio::fs::remove_file(&self.token_file).await {
            Ok(()) => info!("👋 已登出，删除令牌文件 {}", self.token_file.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("⚠️  删除令牌文件失败 {}: {}", self.token_file.display(), e),
        }
    }
}
