//! Builds the production component graph from configuration.
//!
//! Shared by the HTTP server and the `og_ops` CLI so both act on the same
//! store with the same policy.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;

use og_core::clock::{Clock, SystemClock};
use og_core::services::{
    AuditService, AuthService, AuthServiceConfig, CleanupScheduler, OtpService, OtpServiceConfig,
    RetentionPolicy, SchedulerConfig, TestAccountPolicy, TokenService, TokenServiceConfig,
};
use og_infra::database::{
    DatabasePool, MySqlAuditLogRepository, MySqlOtpRepository, MySqlUserRepository,
};
use og_infra::delivery::{create_otp_delivery, LoggingOtpDelivery};
use og_shared::AppConfig;

pub type ProdOtpService = OtpService<MySqlOtpRepository>;

pub type ProdScheduler = CleanupScheduler<ProdOtpService, MySqlAuditLogRepository>;

pub type ProdAuthService = AuthService<
    MySqlUserRepository,
    MySqlOtpRepository,
    MySqlAuditLogRepository,
    LoggingOtpDelivery,
>;

/// Everything the process needs, wired against MySQL
pub struct Components {
    pub pool: DatabasePool,
    pub otp_service: Arc<ProdOtpService>,
    pub auth_service: Arc<ProdAuthService>,
    pub scheduler: Arc<ProdScheduler>,
}

/// Connect, migrate and assemble services
pub async fn build(config: &AppConfig) -> anyhow::Result<Components> {
    let pool = DatabasePool::new(&config.database)
        .await
        .context("connecting to database")?;
    if config.database.run_migrations {
        pool.run_migrations()
            .await
            .context("running database migrations")?;
    }

    let db = pool.get_pool().clone();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let otp_repository = Arc::new(MySqlOtpRepository::new(db.clone()));
    let user_repository = Arc::new(MySqlUserRepository::new(db.clone()));
    let audit_repository = Arc::new(MySqlAuditLogRepository::new(db));

    let otp_service = Arc::new(OtpService::new(
        otp_repository,
        clock.clone(),
        OtpServiceConfig::from(&config.otp),
        TestAccountPolicy::new(&config.otp.test_accounts, config.environment),
    ));
    let token_service = Arc::new(TokenService::new(TokenServiceConfig::from(&config.auth)));
    let audit_service = Arc::new(AuditService::new(audit_repository.clone(), clock.clone()));
    let delivery = Arc::new(create_otp_delivery(config.environment));

    let auth_service = Arc::new(AuthService::new(
        user_repository,
        otp_service.clone(),
        token_service,
        audit_service,
        delivery,
        clock.clone(),
        AuthServiceConfig::default(),
    ));

    let policy = Arc::new(RwLock::new(RetentionPolicy::from_config(&config.retention)));
    let scheduler = Arc::new(CleanupScheduler::new(
        otp_service.clone(),
        audit_repository,
        policy,
        clock,
        SchedulerConfig::from(&config.retention),
    ));

    Ok(Components {
        pool,
        otp_service,
        auth_service,
        scheduler,
    })
}
