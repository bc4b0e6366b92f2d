//! Builds a `gateway_core::identity::Identity` from the inbound header set (§6).

use axum::http::HeaderMap;
use gateway_core::identity::{Identity, IdentityBuilder, IdentityError};

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub fn identity_from_headers(
    headers: &HeaderMap,
    config: &config::IdentityConfig,
) -> Result<Identity, IdentityError> {
    let builder: IdentityBuilder = Identity::builder()
        .request_id(header_str(headers, "x-request-id").unwrap_or_default())
        .caller(header_str(headers, "x-caller").map(str::to_string))
        .client_id(header_str(headers, "zgsm-client-id").map(str::to_string))
        .client_ide(header_str(headers, "zgsm-client-ide").map(str::to_string))
        .client_os(header_str(headers, "x-stainless-os").map(str::to_string))
        .client_version(header_str(headers, "x-costrict-version").map(str::to_string))
        .task_id(header_str(headers, "zgsm-task-id").map(str::to_string))
        .project_path(header_str(headers, "zgsm-project-path").map(str::to_string))
        .auth_token(header_str(headers, "authorization").map(str::to_string))
        .accept_language(header_str(headers, "accept-language").map(str::to_string));

    builder.build(config.enable_time_verify, config.time_window_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn v7() -> String {
        uuid::Uuid::now_v7().to_string()
    }

    #[test]
    fn extracts_client_id_and_defaults_caller() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_str(&v7()).unwrap());
        headers.insert("zgsm-client-id", HeaderValue::from_static("abc"));
        let identity = identity_from_headers(&headers, &config::IdentityConfig::default()).unwrap();
        assert_eq!(identity.client_id.as_deref(), Some("abc"));
        assert_eq!(identity.caller, "chat");
    }

    #[test]
    fn missing_request_id_is_invalid() {
        let headers = HeaderMap::new();
        let err = identity_from_headers(&headers, &config::IdentityConfig::default()).unwrap_err();
        assert_eq!(err, IdentityError::InvalidRequestId);
    }
}
