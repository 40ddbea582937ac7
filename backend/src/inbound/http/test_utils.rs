//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::{AUTHORIZATION, HeaderName};
use actix_web::{App, web};
use chrono::{DateTime, TimeZone, Utc};

use crate::inbound::http::auth::SharedSecret;
use crate::inbound::http::routes::configure;
use crate::inbound::http::state::HttpState;
use crate::middleware::Trace;
use crate::test_support::clock::MutableClock;
use crate::test_support::remote::ScriptedExecutor;

pub const TEST_SECRET: &str = "test-provisioning-secret";
pub const TEST_PREFIX: &str = "/scim/v2";

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Handler state backed by `executor` and a frozen clock.
pub fn test_state(executor: Arc<ScriptedExecutor>) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(
        executor,
        Arc::new(MutableClock::new(fixed_now())),
        SharedSecret::new(TEST_SECRET),
        TEST_PREFIX,
    ))
}

pub fn bearer() -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {TEST_SECRET}"))
}

/// The production route table wrapped in the trace middleware.
pub fn test_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let prefix = state.path_prefix.clone();
    App::new()
        .app_data(state)
        .wrap(Trace)
        .configure(move |cfg| configure(cfg, &prefix))
}
