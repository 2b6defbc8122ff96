use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

#[derive(Debug, Clone)]
pub enum ShortstashError {
    Config(String),
    Validation(String),
    CsrfRejected(String),
    RateLimited(String),
    CodeGeneration(String),
    NotFound(String),
    FileOperation(String),
    Serialization(String),
}

impl ShortstashError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortstashError::Config(_) => "E001",
            ShortstashError::Validation(_) => "E002",
            ShortstashError::CsrfRejected(_) => "E003",
            ShortstashError::RateLimited(_) => "E004",
            ShortstashError::CodeGeneration(_) => "E005",
            ShortstashError::NotFound(_) => "E006",
            ShortstashError::FileOperation(_) => "E007",
            ShortstashError::Serialization(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortstashError::Config(_) => "Configuration Error",
            ShortstashError::Validation(_) => "Validation Error",
            ShortstashError::CsrfRejected(_) => "CSRF Rejected",
            ShortstashError::RateLimited(_) => "Rate Limited",
            ShortstashError::CodeGeneration(_) => "Code Generation Error",
            ShortstashError::NotFound(_) => "Resource Not Found",
            ShortstashError::FileOperation(_) => "File Operation Error",
            ShortstashError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortstashError::Config(msg) => msg,
            ShortstashError::Validation(msg) => msg,
            ShortstashError::CsrfRejected(msg) => msg,
            ShortstashError::RateLimited(msg) => msg,
            ShortstashError::CodeGeneration(msg) => msg,
            ShortstashError::NotFound(msg) => msg,
            ShortstashError::FileOperation(msg) => msg,
            ShortstashError::Serialization(msg) => msg,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// The message exposed to HTTP clients. Internal faults get a generic
    /// message; the detail stays in the server log.
    fn client_message(&self) -> &str {
        match self {
            ShortstashError::CodeGeneration(_) => "Unable to generate unique code",
            ShortstashError::Config(_)
            | ShortstashError::FileOperation(_)
            | ShortstashError::Serialization(_) => "Server error occurred",
            _ => self.message(),
        }
    }
}

impl fmt::Display for ShortstashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortstashError {}

// 便捷的构造函数
impl ShortstashError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        ShortstashError::Config(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortstashError::Validation(msg.into())
    }

    pub fn csrf_rejected<T: Into<String>>(msg: T) -> Self {
        ShortstashError::CsrfRejected(msg.into())
    }

    pub fn rate_limited<T: Into<String>>(msg: T) -> Self {
        ShortstashError::RateLimited(msg.into())
    }

    pub fn code_generation<T: Into<String>>(msg: T) -> Self {
        ShortstashError::CodeGeneration(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortstashError::NotFound(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ShortstashError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortstashError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for ShortstashError {
    fn from(err: std::io::Error) -> Self {
        ShortstashError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShortstashError {
    fn from(err: serde_json::Error) -> Self {
        ShortstashError::Serialization(err.to_string())
    }
}

impl ResponseError for ShortstashError {
    fn status_code(&self) -> StatusCode {
        match self {
            ShortstashError::Validation(_) => StatusCode::BAD_REQUEST,
            ShortstashError::CsrfRejected(_) => StatusCode::FORBIDDEN,
            ShortstashError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ShortstashError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortstashError::Config(_)
            | ShortstashError::CodeGeneration(_)
            | ShortstashError::FileOperation(_)
            | ShortstashError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("{} {}", self.code(), self.format_simple());
        }
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.client_message() }))
    }
}

pub type Result<T> = std::result::Result<T, ShortstashError>;
