use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use log::{error, info};
use secrecy::Secret;

use crate::config::Defaults;
use crate::dispatcher;
use crate::error::AppError;
use crate::session::Gateway;
use crate::types::{
    DispatchConfig, HealthResponse, InvalidReason, Outcome, SendRequest, SendResponse,
    ValidateRequest, ValidateResponse,
};
use crate::validator::{self, Property};

pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
    pub defaults: Defaults,
}

fn status_for(outcome: &Outcome) -> StatusCode {
    match outcome {
        Outcome::Sent { .. } | Outcome::PartiallySent { .. } => StatusCode::OK,
        Outcome::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Outcome::Failed { .. } => StatusCode::BAD_GATEWAY,
    }
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> Result<impl IntoResponse, AppError> {
    let dispatch_id = uuid::Uuid::new_v4().to_string();
    let defaults = &state.defaults;

    let config = DispatchConfig {
        account_sid: req
            .account_sid
            .or_else(|| defaults.account_sid.clone())
            .unwrap_or_default(),
        auth_token: Secret::new(
            req.auth_token
                .or_else(|| defaults.auth_token.clone())
                .unwrap_or_default(),
        ),
        from: req.from.or_else(|| defaults.from.clone()).unwrap_or_default(),
        to: req.to,
        delivery_type: req
            .delivery_type
            .unwrap_or_else(|| defaults.delivery_type.clone()),
    };
    info!(
        "[{}] Dispatching {} bytes via {} from {} to {}",
        dispatch_id,
        req.body.len(),
        config.delivery_type,
        config.from,
        config.to
    );

    let outcome = match validator::validate(Property::From, &config.from).into_result() {
        Ok(()) => dispatcher::dispatch(
            state.gateway.as_ref(),
            &dispatch_id,
            req.body.as_bytes(),
            &config,
        )
        .await,
        Err(explanation) => {
            error!("[{}] Rejected sender: {}", dispatch_id, explanation);
            Outcome::Invalid(InvalidReason::InvalidSender(explanation))
        }
    };
    info!(
        "[{}] Routed to {} ({})",
        dispatch_id,
        outcome.relationship().as_str(),
        outcome.kind()
    );

    Ok((
        status_for(&outcome),
        Json(SendResponse::new(dispatch_id, &outcome)),
    ))
}

pub async fn validate(Json(req): Json<ValidateRequest>) -> Result<impl IntoResponse, AppError> {
    let results = validator::validate_all(&req);
    let valid = results.iter().all(|r| r.valid);
    Ok(Json(ValidateResponse { valid, results }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let status = if state.defaults.has_credentials() {
        "ok"
    } else {
        "unconfigured"
    };
    Ok(Json(HealthResponse {
        status: status.to_string(),
    }))
}
