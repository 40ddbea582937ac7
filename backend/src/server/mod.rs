//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::future::Future;
use std::sync::Arc;

use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tokio::signal;
use tracing::{error, info};

use scim_bridge::Trace;
use scim_bridge::inbound::http::configure;
use scim_bridge::inbound::http::health::HealthState;
use scim_bridge::inbound::http::state::HttpState;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;
    let prefix = http_state.path_prefix.clone();

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .configure(move |cfg| configure(cfg, &prefix))
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        bind_addr,
        path_prefix,
        secret,
        executor,
    } = config;
    let http_state = web::Data::new(HttpState::new(
        executor,
        Arc::new(DefaultClock),
        secret,
        path_prefix,
    ));

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .disable_signals()
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received SIGTERM"),
    }
}

/// Once `signal` resolves, fail liveness and stop the server gracefully.
///
/// `/health/live` answers 503 for as long as in-flight requests drain.
pub async fn drain_on(
    signal: impl Future<Output = ()>,
    health_state: web::Data<HealthState>,
    handle: ServerHandle,
) {
    signal.await;
    health_state.mark_unhealthy();
    info!("liveness set to unhealthy; draining connections");
    handle.stop(true).await;
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use super::*;

    #[actix_rt::test]
    async fn drain_fails_liveness_and_stops_the_server() {
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        let server = HttpServer::new(App::new)
            .workers(1)
            .disable_signals()
            .bind(("127.0.0.1", 0))
            .expect("bind ephemeral port")
            .run();
        let handle = server.handle();
        let running = actix_rt::spawn(server);
        assert!(health_state.is_alive());

        drain_on(ready(()), health_state.clone(), handle).await;

        assert!(!health_state.is_alive());
        running
            .await
            .expect("server task joins")
            .expect("server stops cleanly");
    }
}
