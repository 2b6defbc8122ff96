//! URL 验证模块
//!
//! 验证 URL 安全性，阻止危险协议和内网主机（SSRF 防护）

use std::net::Ipv4Addr;

use url::Url;

/// Maximum accepted URL length.
pub const MAX_URL_LENGTH: usize = 2048;

/// Hosts that are always rejected, regardless of address class.
const FORBIDDEN_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0"];

/// URL 验证错误
#[derive(Debug)]
pub enum UrlValidationError {
    EmptyUrl,
    InvalidFormat(String),
    InvalidScheme(String),
    ForbiddenHost(String),
    TooLong(usize),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
            Self::InvalidScheme(scheme) => write!(
                f,
                "Invalid scheme: {}. Only http:// and https:// are allowed",
                scheme
            ),
            Self::ForbiddenHost(host) => {
                write!(f, "Host not allowed: {}", host)
            }
            Self::TooLong(len) => {
                write!(f, "URL is {} characters, maximum is {}", len, MAX_URL_LENGTH)
            }
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 验证 URL 安全性
///
/// 检查项目（按顺序）：
/// 1. 必须是格式有效的绝对 URL
/// 2. 协议必须是 http:// 或 https://
/// 3. 主机不是 localhost / 私有网段（防止通过重定向进行 SSRF）
/// 4. 总长度不超过 [`MAX_URL_LENGTH`]
pub fn validate_url(url: &str) -> Result<(), UrlValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    // Url::parse rejects relative references, so this also enforces "absolute"
    let parsed = Url::parse(url).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    // Url lowercases the scheme during parsing
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(UrlValidationError::InvalidScheme(scheme.to_string()));
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        if FORBIDDEN_HOSTS.contains(&host.as_str()) {
            return Err(UrlValidationError::ForbiddenHost(host));
        }
        // 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
        if let Ok(addr) = host.parse::<Ipv4Addr>()
            && addr.is_private()
        {
            return Err(UrlValidationError::ForbiddenHost(host));
        }
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong(url.len()));
    }

    Ok(())
}
