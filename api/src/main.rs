use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

use og_api::app::create_app;
use og_api::routes::{AuthState, OpsState};
use og_api::{bootstrap, telemetry};
use og_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    telemetry::init_tracing(&config.logging)?;

    info!(
        environment = %config.environment,
        bind = %config.server.bind_address(),
        "Starting OtpGate API server"
    );

    let components = bootstrap::build(&config).await?;

    if config.retention.enabled {
        components.scheduler.start();
    } else {
        warn!(
            event = "cleanup_scheduler_disabled",
            "Retention scheduler disabled by configuration; expired OTPs will accumulate"
        );
    }

    let auth_state = web::Data::new(AuthState {
        auth_service: components.auth_service.clone(),
    });
    if config.server.ops_token.is_none() {
        warn!(
            event = "ops_token_missing",
            "server.ops_token is not set; every ops request will be refused"
        );
    }
    let ops_state = web::Data::new(OpsState {
        scheduler: components.scheduler.clone(),
        operator_token: config.server.ops_token.clone(),
    });

    let mut server = HttpServer::new(move || {
        create_app(auth_state.clone(), ops_state.clone()).wrap(TracingLogger::default())
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(config.server.bind_address())
        .with_context(|| format!("binding {}", config.server.bind_address()))?
        .run()
        .await?;

    info!("HTTP server stopped, shutting down scheduler");
    components.scheduler.stop().await;
    components.pool.close().await;
    Ok(())
}
