mod config;
mod dispatcher;
mod error;
mod handlers;
mod session;
mod types;
mod validator;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use tower_http::cors::CorsLayer;

use config::Settings;
use handlers::AppState;
use session::TwilioGateway;

async fn auth_middleware(
    State(api_key): State<Option<Arc<str>>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(api_key) = api_key else {
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth_header.strip_prefix("Bearer ").unwrap_or(auth_header);

    if token == &*api_key {
        Ok(next.run(req).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn router(state: Arc<AppState>, api_key: Option<Arc<str>>) -> Router {
    Router::new()
        .route("/api/send", post(handlers::send_message))
        .route("/api/validate", post(handlers::validate))
        .route("/api/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(api_key, auth_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let settings = Settings::from_env()?;
    info!("Delivery API: {}", settings.api_base);
    if !settings.defaults.has_credentials() {
        log::warn!("No default Twilio credentials; every request must supply its own");
    }

    let gateway = TwilioGateway::new(&settings.api_base, settings.timeout)?;
    let state = Arc::new(AppState {
        gateway: Arc::new(gateway),
        defaults: settings.defaults,
    });

    let app = router(state, settings.api_key.map(Arc::from));

    let addr = format!("0.0.0.0:{}", settings.port);
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
