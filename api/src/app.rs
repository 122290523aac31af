//! Application factory

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, HttpResponse,
};

use og_core::repositories::{AuditLogRepository, OtpRepository, UserRepository};
use og_core::services::{ExpiredOtpSweeper, LogRetentionStore, OtpDelivery};
use og_shared::ErrorResponse;

use crate::middleware::{JwtAuth, OperatorAuth};
use crate::routes::{self, health::health_check, AuthState, OpsState};

/// Create the application with all routes. Middleware is added by the caller.
pub fn create_app<U, O, A, D, S, L>(
    auth_state: web::Data<AuthState<U, O, A, D>>,
    ops_state: web::Data<OpsState<S, L>>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    U: UserRepository + 'static,
    O: OtpRepository + 'static,
    A: AuditLogRepository + 'static,
    D: OtpDelivery + 'static,
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    let jwt_guard = JwtAuth::new(auth_state.auth_service.token_service());
    let operator_guard = OperatorAuth::new(ops_state.operator_token.clone());

    App::new()
        .app_data(auth_state)
        .app_data(ops_state)
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            let body = ErrorResponse::new("validation_error", err.to_string());
            actix_web::error::InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(body),
            )
            .into()
        }))
        .route("/health", web::get().to(health_check))
        .configure(|cfg| routes::auth::configure::<U, O, A, D>(cfg, jwt_guard))
        .configure(|cfg| routes::ops::configure::<S, L>(cfg, operator_guard))
        .default_service(web::route().to(not_found))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        "not_found",
        "The requested resource was not found",
    ))
}
