//! SCIM discovery documents.
//!
//! `ServiceProviderConfig` and `ResourceTypes` are public so identity
//! providers can read capabilities before a secret is configured; `Schemas`
//! requires the provisioning bearer.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, get, web};
use serde_json::{Value, json};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::ProvisioningAuth;
use crate::inbound::http::envelope::{ListResponse, ResourceLocator, scim_response};
use crate::inbound::http::schemas::{
    ENTERPRISE_USER_SCHEMA, GROUP_SCHEMA, RESOURCE_TYPE_SCHEMA, SCHEMA_SCHEMA,
    SERVICE_PROVIDER_CONFIG_SCHEMA, USER_SCHEMA,
};
use crate::inbound::http::state::HttpState;

const RESOURCE_TYPE_DESCRIPTION: &str = "https://tools.ietf.org/html/rfc7643#section-8.7.1";

fn service_provider_config() -> Value {
    json!({
        "schemas": [SERVICE_PROVIDER_CONFIG_SCHEMA],
        "patch": { "supported": true },
        "bulk": { "supported": false, "maxOperations": 0, "maxPayloadSize": 0 },
        "filter": { "supported": false, "maxResults": 0 },
        "changePassword": { "supported": false },
        "sort": { "supported": false },
        "etag": { "supported": false },
        "authenticationSchemes": [{
            "name": "OAuth Bearer Token",
            "description": "Authentication scheme using the OAuth Bearer Token Standard",
            "specUri": "http://www.rfc-editor.org/info/rfc6750",
            "type": "oauthbearertoken",
            "primary": true,
        }],
    })
}

fn user_resource_type(locator: &ResourceLocator) -> Value {
    json!({
        "schemas": [RESOURCE_TYPE_SCHEMA],
        "id": "User",
        "name": "User",
        "endpoint": "/Users",
        "description": RESOURCE_TYPE_DESCRIPTION,
        "schema": USER_SCHEMA,
        "schemaExtensions": [{ "schema": ENTERPRISE_USER_SCHEMA, "required": false }],
        "meta": {
            "location": locator.location("ResourceTypes", "User"),
            "resourceType": "ResourceType",
        },
    })
}

fn group_resource_type(locator: &ResourceLocator) -> Value {
    json!({
        "schemas": [RESOURCE_TYPE_SCHEMA],
        "id": "Group",
        "name": "Group",
        "endpoint": "/Groups",
        "description": RESOURCE_TYPE_DESCRIPTION,
        "schema": GROUP_SCHEMA,
        "meta": {
            "location": locator.location("ResourceTypes", "Group"),
            "resourceType": "ResourceType",
        },
    })
}

fn attribute(name: &str, kind: &str, required: bool, multi_valued: bool) -> Value {
    json!({
        "name": name,
        "type": kind,
        "multiValued": multi_valued,
        "required": required,
        "mutability": "readWrite",
        "returned": "default",
    })
}

fn schema_documents() -> Vec<Value> {
    vec![
        json!({
            "schemas": [SCHEMA_SCHEMA],
            "id": USER_SCHEMA,
            "name": "User",
            "description": "User Account",
            "attributes": [
                attribute("userName", "string", true, false),
                attribute("name", "complex", false, false),
                attribute("displayName", "string", false, false),
                attribute("emails", "complex", true, true),
                attribute("externalId", "string", false, false),
            ],
        }),
        json!({
            "schemas": [SCHEMA_SCHEMA],
            "id": GROUP_SCHEMA,
            "name": "Group",
            "description": "Group",
            "attributes": [
                attribute("displayName", "string", true, false),
                attribute("members", "complex", false, true),
                attribute("externalId", "string", false, false),
            ],
        }),
    ]
}

#[get("/ServiceProviderConfig")]
pub async fn get_service_provider_config() -> ApiResult<HttpResponse> {
    scim_response(StatusCode::OK, &service_provider_config())
}

#[get("/ResourceTypes")]
pub async fn list_resource_types(
    req: HttpRequest,
    state: web::Data<HttpState>,
) -> ApiResult<HttpResponse> {
    let locator = ResourceLocator::from_request(&req, &state.path_prefix);
    let types = vec![user_resource_type(&locator), group_resource_type(&locator)];
    scim_response(StatusCode::OK, &ListResponse::new(types))
}

#[get("/ResourceTypes/{name}")]
pub async fn get_resource_type(
    req: HttpRequest,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let locator = ResourceLocator::from_request(&req, &state.path_prefix);
    let document = match path.as_str() {
        "User" => user_resource_type(&locator),
        "Group" => group_resource_type(&locator),
        other => return Err(Error::not_found(format!("unknown resource type {other}"))),
    };
    scim_response(StatusCode::OK, &document)
}

#[get("/Schemas")]
pub async fn list_schemas(_auth: ProvisioningAuth) -> ApiResult<HttpResponse> {
    scim_response(StatusCode::OK, &ListResponse::new(schema_documents()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn service_provider_config_advertises_patch_without_bulk() {
        let document = service_provider_config();
        assert_eq!(document["patch"]["supported"], true);
        assert_eq!(document["bulk"]["supported"], false);
        assert_eq!(document["authenticationSchemes"][0]["type"], "oauthbearertoken");
    }

    #[rstest]
    fn resource_type_locations_follow_the_locator() {
        let locator = ResourceLocator::new("http://bridge.test/scim");
        assert_eq!(
            user_resource_type(&locator)["meta"]["location"],
            "http://bridge.test/scim/ResourceTypes/User"
        );
        assert_eq!(
            group_resource_type(&locator)["meta"]["location"],
            "http://bridge.test/scim/ResourceTypes/Group"
        );
    }

    #[rstest]
    fn schema_documents_cover_users_and_groups() {
        let ids: Vec<Value> = schema_documents()
            .into_iter()
            .map(|doc| doc["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(USER_SCHEMA), json!(GROUP_SCHEMA)]);
    }
}
