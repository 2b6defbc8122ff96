use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{Result, ShortstashError};
use crate::session::{SESSION_COOKIE_NAME, SessionManager, session_cookie};
use crate::storages::{Storage, StoredUrl, SweepTrigger};
use crate::utils::{CODE_LENGTH, MAX_CODE_ATTEMPTS, generate_random_code, validate_url};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateResponse {
    pub success: bool,
    pub short_url: String,
    pub original_url: String,
    /// Characters saved over the original URL. Negative for very short URLs.
    pub saved: i64,
    pub total_in_session: usize,
}

pub struct ShortenService;

impl ShortenService {
    /// `POST /` — create (or reuse) a short link for the submitted URL.
    ///
    /// Check order matches the external contract: rate limit, JSON shape,
    /// CSRF token, URL presence, URL safety. The body is parsed manually so
    /// the rate limiter runs before any payload inspection.
    pub async fn handle_create(
        req: HttpRequest,
        body: web::Bytes,
        sessions: web::Data<SessionManager>,
        storage: web::Data<Arc<dyn Storage>>,
        sweep: web::Data<SweepTrigger>,
        config: web::Data<Config>,
    ) -> Result<HttpResponse> {
        let cookie = req.cookie(SESSION_COOKIE_NAME);
        let ticket = sessions.touch(cookie.as_ref().map(|c| c.value()));

        sessions.check_rate_limit(&ticket.id)?;

        let input: CreateRequest = match serde_json::from_slice(&body) {
            Ok(input) => input,
            Err(e) => {
                debug!("rejected unparsable creation body: {}", e);
                return Err(ShortstashError::validation("Invalid JSON data"));
            }
        };

        if !sessions.validate_csrf(&ticket.id, &input.csrf_token) {
            return Err(ShortstashError::csrf_rejected("Invalid request token"));
        }

        let url = input.url.trim().to_string();
        if url.is_empty() {
            return Err(ShortstashError::validation("URL is required"));
        }
        if let Err(e) = validate_url(&url) {
            warn!("rejected URL submission: {}", e);
            return Err(ShortstashError::validation("Invalid or unsafe URL"));
        }

        sessions.note_creation(&ticket.id);

        // Same URL submitted twice in one session reuses the existing code;
        // nothing new is written in that case.
        let (code, total) = match sessions.code_for_url(&ticket.id, &url) {
            Some(existing) => (existing, sessions.total(&ticket.id)),
            None => {
                let code = Self::unique_code(&sessions, &ticket.id)?;
                let total = sessions.store_link(&ticket.id, code.clone(), url.clone());
                let record = StoredUrl::new(code.clone(), url.clone(), Utc::now());
                storage.set(record).await?;
                info!("created short link {}", code);
                (code, total)
            }
        };

        if sweep.should_fire() {
            if let Err(e) = storage.sweep().await {
                warn!("background sweep failed: {}", e);
            }
            sessions.prune_stale();
        }

        let short_url = format!("{}{}", config.base_url, code);
        let saved = url.len() as i64 - short_url.len() as i64;

        let mut builder = HttpResponse::Ok();
        if ticket.fresh {
            builder.cookie(session_cookie(&ticket.id, config.cookie_secure));
        }
        Ok(builder.json(CreateResponse {
            success: true,
            short_url,
            original_url: url,
            saved,
            total_in_session: total,
        }))
    }

    /// Generate a code not already held by this session, retrying up to
    /// [`MAX_CODE_ATTEMPTS`] times before failing permanently.
    fn unique_code(sessions: &SessionManager, session_id: &str) -> Result<String> {
        let mut code = generate_random_code(CODE_LENGTH);
        let mut attempts = 1;
        while sessions.contains_code(session_id, &code) {
            if attempts >= MAX_CODE_ATTEMPTS {
                return Err(ShortstashError::code_generation(format!(
                    "failed to generate a unique code after {} attempts",
                    MAX_CODE_ATTEMPTS
                )));
            }
            code = generate_random_code(CODE_LENGTH);
            attempts += 1;
        }
        Ok(code)
    }
}
