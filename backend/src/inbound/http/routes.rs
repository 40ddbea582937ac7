//! Route table for the SCIM surface.

use actix_web::{Scope, web};

use crate::inbound::http::error::json_error_handler;
use crate::inbound::http::{discovery, groups, health, users};

/// JSON extractor settings shared by every SCIM body.
///
/// Bodies arrive as `application/scim+json` or plain JSON; malformed ones
/// become SCIM `400` envelopes.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(json_error_handler)
}

/// Every SCIM endpoint mounted under `path_prefix`.
///
/// `path_prefix` must already be normalised: empty, or starting with `/`
/// without a trailing slash.
pub fn scim_scope(path_prefix: &str) -> Scope {
    web::scope(path_prefix)
        .app_data(json_config())
        .service(discovery::get_service_provider_config)
        .service(discovery::list_resource_types)
        .service(discovery::get_resource_type)
        .service(discovery::list_schemas)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::replace_user)
        .service(users::delete_user)
        .service(groups::list_groups)
        .service(groups::create_group)
        .service(groups::replace_group)
        .service(groups::patch_group)
        .service(groups::delete_group)
}

/// Register health checks and the SCIM scope on an app.
///
/// Health checks go first: an empty prefix makes the SCIM scope match every path,
/// and anything registered after it would be unreachable.
pub fn configure(cfg: &mut web::ServiceConfig, path_prefix: &str) {
    cfg.service(health::root)
        .service(health::ready)
        .service(health::live)
        .service(scim_scope(path_prefix));
}
