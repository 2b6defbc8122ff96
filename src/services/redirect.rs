use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, error, trace};

use crate::config::Config;
use crate::session::{SESSION_COOKIE_NAME, SessionManager, session_cookie};
use crate::storages::Storage;
use crate::utils::{sanitize_code, validate_url};

const NOT_FOUND_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>404 - Not Found</title>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: sans-serif; text-align: center; padding: 50px;">
    <h2>Short URL not found or expired</h2>
    <p>This link expires after 1 hour.</p>
    <a href="/">Create new short URL</a>
</body>
</html>
"#;

pub struct RedirectService;

impl RedirectService {
    /// `GET /{code}` — resolve a short code and redirect.
    ///
    /// The session map is consulted first, then the shared store. The stored
    /// URL is re-validated before use: a record could have been valid at
    /// creation but the policy changed, or storage was tampered with.
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        sessions: web::Data<SessionManager>,
        storage: web::Data<Arc<dyn Storage>>,
        config: web::Data<Config>,
    ) -> impl Responder {
        let captured_path = path.into_inner();
        let code = sanitize_code(&captured_path);
        if code.is_empty() {
            trace!("path sanitized to nothing: {:?}", captured_path);
            return Self::not_found_response();
        }

        let cookie = req.cookie(SESSION_COOKIE_NAME);
        let ticket = sessions.touch(cookie.as_ref().map(|c| c.value()));

        let target = match sessions.lookup_url(&ticket.id, &code) {
            Some(url) => Some(url),
            None => {
                trace!("session miss for {}, trying shared store", code);
                storage.get(&code).await.map(|record| record.url)
            }
        };

        let Some(url) = target else {
            debug!("short code not found: {}", code);
            return Self::not_found_response();
        };

        if let Err(e) = validate_url(&url) {
            error!("stored URL for {} failed re-validation: {}", code, e);
            return Self::not_found_response();
        }

        let mut builder = HttpResponse::build(StatusCode::FOUND);
        if ticket.fresh {
            builder.cookie(session_cookie(&ticket.id, config.cookie_secure));
        }
        builder.insert_header(("Location", url)).finish()
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body(NOT_FOUND_HTML)
    }
}
