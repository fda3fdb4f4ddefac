use crate::models::UserRole;
use crate::session::Session;

/// 路由检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    RedirectToLogin,
    /// 角色不符，跳转到该角色自己的首页
    RedirectTo(&'static str),
}

/// 按角色限制访问
#[derive(Debug, Clone)]
pub struct RouteGuard {
    allowed: Vec<UserRole>,
}

impl RouteGuard {
    pub fn new(allowed: &[UserRole]) -> Self {
        Self {
            allowed: allowed.to_vec(),
        }
    }

    pub fn check(&self, session: &Session) -> Access {
        let Some(user) = session.user().filter(|_| session.is_authenticated()) else {
            return Access::RedirectToLogin;
        };
        if self.allowed.is_empty() || self.allowed.contains(&user.role) {
            Access::Granted
        } else {
            Access::RedirectTo(user.role.dashboard_path())
        }
    }
}
