use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::Config;
use crate::errors::{Result, ShortstashError};
use crate::session::{SESSION_COOKIE_NAME, SessionManager, session_cookie};

#[derive(Deserialize, Debug)]
pub struct HomeQuery {
    clear: Option<String>,
    csrf_token: Option<String>,
}

pub struct HomeService;

impl HomeService {
    /// `GET /` — establish the session and hand out its CSRF token.
    ///
    /// With `?clear=1&csrf_token=…` the session's mapping is wiped and the
    /// client is redirected back to `/`.
    pub async fn handle_index(
        req: HttpRequest,
        query: web::Query<HomeQuery>,
        sessions: web::Data<SessionManager>,
        config: web::Data<Config>,
    ) -> Result<HttpResponse> {
        let cookie = req.cookie(SESSION_COOKIE_NAME);
        let ticket = sessions.touch(cookie.as_ref().map(|c| c.value()));

        if query.clear.is_some() {
            let token = query.csrf_token.as_deref().unwrap_or("");
            if !sessions.validate_csrf(&ticket.id, token) {
                return Err(ShortstashError::csrf_rejected("Invalid request token"));
            }
            sessions.clear(&ticket.id);
            info!("session mapping cleared");

            let mut builder = HttpResponse::Found();
            if ticket.fresh {
                builder.cookie(session_cookie(&ticket.id, config.cookie_secure));
            }
            return Ok(builder.insert_header(("Location", "/")).finish());
        }

        let mut builder = HttpResponse::Ok();
        if ticket.fresh {
            builder.cookie(session_cookie(&ticket.id, config.cookie_secure));
        }
        Ok(builder.json(json!({
            "csrf_token": ticket.csrf_token,
            "total_in_session": sessions.total(&ticket.id),
        })))
    }
}
