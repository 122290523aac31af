//! Login endpoints
//!
//! Thin translation between JSON bodies and `AuthService`; all state
//! transitions happen in the service.

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use og_core::repositories::{AuditLogRepository, OtpRepository, UserRepository};
use og_core::services::{AuthService, OtpDelivery};
use og_shared::ApiResponse;

use crate::dto::{LoginRequest, ProfileResponse, ResendRequest, VerifyRequest};
use crate::handlers::ApiError;
use crate::middleware::auth::{AuthContext, BearerAuth, JwtAuth};

/// Shared state for the auth routes
pub struct AuthState<U, O, A, D>
where
    U: UserRepository + 'static,
    O: OtpRepository + 'static,
    A: AuditLogRepository + 'static,
    D: OtpDelivery + 'static,
{
    pub auth_service: Arc<AuthService<U, O, A, D>>,
}

pub fn configure<U, O, A, D>(cfg: &mut web::ServiceConfig, guard: JwtAuth)
where
    U: UserRepository + 'static,
    O: OtpRepository + 'static,
    A: AuditLogRepository + 'static,
    D: OtpDelivery + 'static,
{
    cfg.service(
        web::scope("/api/v1/auth")
            .route("/login", web::post().to(login::<U, O, A, D>))
            .route("/resend", web::post().to(resend::<U, O, A, D>))
            .route("/verify", web::post().to(verify::<U, O, A, D>))
            .service(
                web::resource("/profile")
                    .wrap(BearerAuth::from(guard))
                    .route(web::get().to(profile::<U, O, A, D>)),
            ),
    );
}

/// POST /api/v1/auth/login
pub async fn login<U, O, A, D>(
    state: web::Data<AuthState<U, O, A, D>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    O: OtpRepository + 'static,
    A: AuditLogRepository + 'static,
    D: OtpDelivery + 'static,
{
    let challenge = state
        .auth_service
        .initiate_login(&request.identifier, request.country_code.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(challenge)))
}

/// POST /api/v1/auth/resend
pub async fn resend<U, O, A, D>(
    state: web::Data<AuthState<U, O, A, D>>,
    request: web::Json<ResendRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    O: OtpRepository + 'static,
    A: AuditLogRepository + 'static,
    D: OtpDelivery + 'static,
{
    let challenge = state.auth_service.resend_otp(&request.identifier).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(challenge)))
}

/// POST /api/v1/auth/verify
pub async fn verify<U, O, A, D>(
    state: web::Data<AuthState<U, O, A, D>>,
    request: web::Json<VerifyRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    O: OtpRepository + 'static,
    A: AuditLogRepository + 'static,
    D: OtpDelivery + 'static,
{
    let session = state
        .auth_service
        .verify_and_login(&request.identifier, &request.session_token, &request.code)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(session)))
}

/// GET /api/v1/auth/profile
pub async fn profile<U, O, A, D>(
    state: web::Data<AuthState<U, O, A, D>>,
    auth: AuthContext,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    O: OtpRepository + 'static,
    A: AuditLogRepository + 'static,
    D: OtpDelivery + 'static,
{
    let user = state.auth_service.profile(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(ProfileResponse::from(user))))
}
