//! Ops endpoints for the cleanup scheduler
//!
//! These expose the same controls as the `og_ops` CLI. Every route requires
//! `Authorization: Bearer <server.ops_token>`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use og_core::errors::CleanupError;
use og_core::services::{CleanupScheduler, ExpiredOtpSweeper, LogRetentionStore};
use og_shared::ApiResponse;

use crate::dto::{CleanupRunResponse, RunCleanupRequest};
use crate::handlers::ApiError;
use crate::middleware::auth::{BearerAuth, OperatorAuth};

/// Shared state for the ops routes
pub struct OpsState<S, L>
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    pub scheduler: Arc<CleanupScheduler<S, L>>,
    /// Token accepted by the ops guard
    pub operator_token: Option<String>,
}

pub fn configure<S, L>(cfg: &mut web::ServiceConfig, guard: OperatorAuth)
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    cfg.service(
        web::scope("/ops/cleanup")
            .wrap(BearerAuth::from(guard))
            .route("/status", web::get().to(status::<S, L>))
            .route("/policy", web::get().to(policy::<S, L>))
            .route("/run", web::post().to(run::<S, L>))
            .route("/emergency-disable", web::post().to(emergency_disable::<S, L>))
            .route("/enable-safe-defaults", web::post().to(enable_safe_defaults::<S, L>)),
    );
}

/// GET /ops/cleanup/status
pub async fn status<S, L>(state: web::Data<OpsState<S, L>>) -> HttpResponse
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    HttpResponse::Ok().json(ApiResponse::success(state.scheduler.status().await))
}

/// GET /ops/cleanup/policy
pub async fn policy<S, L>(state: web::Data<OpsState<S, L>>) -> HttpResponse
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "policy": state.scheduler.describe().await,
    })))
}

/// POST /ops/cleanup/run
///
/// An aborted cycle is a normal outcome and is reported with 200 and
/// `safety_passed = false`.
pub async fn run<S, L>(
    state: web::Data<OpsState<S, L>>,
    body: Option<web::Json<RunCleanupRequest>>,
) -> Result<HttpResponse, ApiError>
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    let confirm = body.map(|b| b.confirm).unwrap_or(false);

    let response = match state.scheduler.run_once(confirm).await {
        Ok(record) => CleanupRunResponse {
            safety_passed: record.preflight.as_ref().map_or(true, |p| p.passed),
            issues: Vec::new(),
            run: Some(record),
        },
        Err(CleanupError::SafetyVerificationFailed { issues }) => CleanupRunResponse {
            safety_passed: false,
            issues,
            run: state.scheduler.last_run().await,
        },
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// POST /ops/cleanup/emergency-disable
pub async fn emergency_disable<S, L>(state: web::Data<OpsState<S, L>>) -> HttpResponse
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    state.scheduler.emergency_disable_all().await;
    tracing::warn!(event = "cleanup_emergency_disable", "Emergency disable requested via ops API");
    HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "policy": state.scheduler.describe().await,
    })))
}

/// POST /ops/cleanup/enable-safe-defaults
pub async fn enable_safe_defaults<S, L>(state: web::Data<OpsState<S, L>>) -> HttpResponse
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    state.scheduler.enable_safe_defaults().await;
    tracing::info!(event = "cleanup_safe_defaults_enabled", "Safe defaults restored via ops API");
    HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "policy": state.scheduler.describe().await,
    })))
}
