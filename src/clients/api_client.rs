//! 考试平台 API 客户端
//!
//! 封装所有与后端 REST API 相关的调用逻辑。每个请求都从注入的会话中
//! 取令牌作为 Bearer 头；收到 401 时清除会话。

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError, FileError};
use crate::models::grade::{
    AdminStats, GradeRecord, GradingHistoryEntry, PendingSpeaking, PendingWriting, SpeakingGrade, WritingGrade,
};
use crate::models::question::QuestionCreate;
use crate::models::test::{
    AttemptCreate, ListeningPart, ListeningPartCreate, ReadingPassage, ReadingPassageCreate, SpeakingTask,
    SpeakingTaskCreate, SpeakingUploadResponse, TestAttempt, TestTemplate, UploadResponse, WritingTask,
    WritingTaskCreate,
};
use crate::models::user::{LoginRequest, RegisterRequest, TokenResponse};
use crate::models::{Question, SubmissionPayload, TestAttemptWithDetails, User};
use crate::session::SharedSession;

/// 上传文件的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Audio,
}

impl UploadKind {
    fn endpoint(self) -> &'static str {
        match self {
            UploadKind::Image => "/upload/image",
            UploadKind::Audio => "/upload/audio",
        }
    }
}

/// 按扩展名推断上传文件的 MIME 类型
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

/// 从 FastAPI 的错误响应中取 `detail`
fn extract_detail(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    match parsed.get("detail")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// 平台 API 客户端
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SharedSession,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config, session: SharedSession) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::Other(format!("无法创建 HTTP 客户端: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 附加 Bearer 令牌
    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let session = self.session.read().await;
        let token = session.token().ok_or(ApiError::NotLoggedIn)?;
        Ok(builder.bearer_auth(token))
    }

    /// 发送请求并检查状态码
    async fn dispatch(&self, endpoint: &str, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        debug!("➡️  {}", endpoint);
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::request_failed(endpoint, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("🔒 {} 返回 401，清除登录状态", endpoint);
            self.session.write().await.clear().await;
            return Err(ApiError::Unauthorized {
                endpoint: endpoint.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::bad_response(endpoint, status.as_u16(), extract_detail(&body)));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, endpoint: &str, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.dispatch(endpoint, builder).await?;
        response.json::<T>().await.map_err(|e| ApiError::DecodeFailed {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.authorized(self.client.get(self.url(path))).await?;
        self.send_json(path, builder).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let builder = self.authorized(self.client.post(self.url(path)).json(body)).await?;
        self.send_json(path, builder).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let builder = self.authorized(self.client.put(self.url(path)).json(body)).await?;
        self.send_json(path, builder).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let builder = self.authorized(self.client.delete(self.url(path))).await?;
        self.dispatch(path, builder).await?;
        Ok(())
    }

    async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, ApiError> {
        let builder = self.authorized(self.client.post(self.url(path)).multipart(form)).await?;
        self.send_json(path, builder).await
    }

    fn file_part(bytes: Vec<u8>, file_name: String, mime: &str) -> Result<Part, ApiError> {
        Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| ApiError::request_failed("multipart", e))
    }

    // ========== 认证 ==========

    /// 登录并把令牌写入会话，随后拉取当前用户
    pub async fn login(&self, email: &str, password: &str) -> crate::error::Result<User> {
        let endpoint = "/auth/login";
        let builder = self.client.post(self.url(endpoint)).json(&LoginRequest { email, password });
        let token: TokenResponse = self.send_json(endpoint, builder).await?;
        self.session.write().await.set_token(token.access_token).await?;
        let user = self.me().await?;
        info!("🔓 登录成功: {} ({})", user.email, user.role);
        Ok(user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let endpoint = "/auth/register";
        let builder = self.client.post(self.url(endpoint)).json(request);
        self.send_json(endpoint, builder).await
    }

    /// 获取当前用户并写入会话
    pub async fn me(&self) -> Result<User, ApiError> {
        let user: User = self.get("/users/me").await?;
        self.session.write().await.set_user(user.clone());
        Ok(user)
    }

    // ========== 试卷与作答 ==========

    pub async fn list_templates(&self) -> Result<Vec<TestTemplate>, ApiError> {
        self.get("/tests/templates").await
    }

    pub async fn get_template(&self, template_id: i64) -> Result<TestTemplate, ApiError> {
        self.get(&format!("/tests/templates/{}", template_id)).await
    }

    pub async fn start_attempt(&self, template_id: i64) -> Result<TestAttempt, ApiError> {
        self.post(
            "/tests/attempts",
            &AttemptCreate {
                test_template_id: template_id,
            },
        )
        .await
    }

    pub async fn get_attempt(&self, attempt_id: i64) -> Result<TestAttemptWithDetails, ApiError> {
        self.get(&format!("/tests/attempts/{}", attempt_id)).await
    }

    pub async fn my_attempts(&self) -> Result<Vec<TestAttempt>, ApiError> {
        self.get("/tests/attempts/me").await
    }

    pub async fn submit_attempt(&self, attempt_id: i64, payload: &SubmissionPayload) -> Result<TestAttempt, ApiError> {
        self.put(&format!("/tests/attempts/{}/submit", attempt_id), payload).await
    }

    /// 上传口语录音（multipart 字段 `file`，文件名 recording.webm）
    pub async fn upload_speaking(
        &self,
        attempt_id: i64,
        task_id: i64,
        audio: Vec<u8>,
    ) -> Result<SpeakingUploadResponse, ApiError> {
        let part = Self::file_part(audio, "recording.webm".to_string(), "audio/webm")?;
        let form = Form::new().part("file", part);
        self.post_multipart(&format!("/tests/attempts/{}/speaking/{}/upload", attempt_id, task_id), form)
            .await
    }

    // ========== 文件上传 ==========

    /// 上传图片或音频，返回服务端 URL
    pub async fn upload_file(&self, kind: UploadKind, path: &Path) -> crate::error::Result<String> {
        let shown = path.display().to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FileError::read_failed(shown.clone(), e))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let part = Self::file_part(bytes, file_name, mime_for(path))?;
        let form = Form::new().part("file", part);
        let response: UploadResponse = self.post_multipart(kind.endpoint(), form).await?;
        if response.url.is_empty() {
            return Err(ApiError::MissingUploadUrl {
                endpoint: kind.endpoint().to_string(),
            }
            .into());
        }
        info!("📤 已上传 {} -> {}", shown, response.url);
        Ok(response.url)
    }

    // ========== 内容管理 ==========

    pub async fn list_listening_parts(&self) -> Result<Vec<ListeningPart>, ApiError> {
        self.get("/listening/parts").await
    }

    pub async fn create_listening_part(&self, part: &ListeningPartCreate) -> Result<ListeningPart, ApiError> {
        self.post("/listening/parts", part).await
    }

    pub async fn delete_listening_part(&self, part_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/listening/parts/{}", part_id)).await
    }

    pub async fn list_listening_questions(&self) -> Result<Vec<Question>, ApiError> {
        self.get("/listening/questions").await
    }

    pub async fn create_listening_question(&self, question: &QuestionCreate) -> Result<Question, ApiError> {
        self.post("/listening/questions", question).await
    }

    pub async fn delete_listening_question(&self, question_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/listening/questions/{}", question_id)).await
    }

    pub async fn list_reading_passages(&self) -> Result<Vec<ReadingPassage>, ApiError> {
        self.get("/reading/passages").await
    }

    pub async fn create_reading_passage(&self, passage: &ReadingPassageCreate) -> Result<ReadingPassage, ApiError> {
        self.post("/reading/passages", passage).await
    }

    pub async fn delete_reading_passage(&self, passage_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/reading/passages/{}", passage_id)).await
    }

    pub async fn list_reading_questions(&self) -> Result<Vec<Question>, ApiError> {
        self.get("/reading/questions").await
    }

    pub async fn create_reading_question(&self, question: &QuestionCreate) -> Result<Question, ApiError> {
        self.post("/reading/questions", question).await
    }

    pub async fn delete_reading_question(&self, question_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/reading/questions/{}", question_id)).await
    }

    pub async fn create_writing_task(&self, task: &WritingTaskCreate) -> Result<WritingTask, ApiError> {
        self.post("/writing/tasks", task).await
    }

    pub async fn create_speaking_task(&self, task: &SpeakingTaskCreate) -> Result<SpeakingTask, ApiError> {
        self.post("/speaking/tasks", task).await
    }

    // ========== 评分 ==========

    pub async fn pending_writing(&self) -> Result<Vec<PendingWriting>, ApiError> {
        self.get("/grading/writing/pending").await
    }

    pub async fn pending_speaking(&self) -> Result<Vec<PendingSpeaking>, ApiError> {
        self.get("/grading/speaking/pending").await
    }

    pub async fn grade_writing(&self, submission_id: i64, grade: &WritingGrade) -> Result<GradeRecord, ApiError> {
        self.post(&format!("/grading/writing/{}", submission_id), grade).await
    }

    pub async fn grade_speaking(&self, submission_id: i64, grade: &SpeakingGrade) -> Result<GradeRecord, ApiError> {
        self.post(&format!("/grading/speaking/{}", submission_id), grade).await
    }

    pub async fn grading_history(&self) -> Result<Vec<GradingHistoryEntry>, ApiError> {
        self.get("/grading/history").await
    }

    // ========== 管理 ==========

    pub async fn admin_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/admin/users").await
    }

    pub async fn admin_tests(&self) -> Result<Vec<TestTemplate>, ApiError> {
        self.get("/admin/tests").await
    }

    pub async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.get("/admin/stats").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    #[test]
    fn fastapi_detail_is_extracted() {
        assert_eq!(extract_detail(r#"{"detail":"Test is not in progress"}"#).as_deref(), Some("Test is not in progress"));
        assert!(extract_detail("<html>").is_none());
        assert!(extract_detail(r#"{"detail":[{"loc":["body"]}]}"#).is_some());
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for(Path::new("a/map.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("part1.mp3")), "audio/mpeg");
        assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn requests_without_a_token_are_refused_locally() {
        let config = Config::default();
        let client = ApiClient::new(&config, Session::new("unused_token_file").into_shared()).unwrap();
        let err = client.list_templates().await.unwrap_err();
        assert!(matches!(err, ApiError::NotLoggedIn));
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn content_listings_also_need_a_token() {
        let client = ApiClient::new(&Config::default(), Session::new("unused_token_file").into_shared()).unwrap();
        assert!(matches!(client.list_reading_questions().await, Err(ApiError::NotLoggedIn)));
        assert!(matches!(client.list_listening_questions().await, Err(ApiError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn upload_of_missing_file_names_the_path() {
        let config = Config::default();
        let client = ApiClient::new(&config, Session::new("unused_token_file").into_shared()).unwrap();
        let err = client
            .upload_file(UploadKind::Image, Path::new("no/such/map.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::File(_)));
        assert!(err.to_string().contains("map.png"));
    }
}
