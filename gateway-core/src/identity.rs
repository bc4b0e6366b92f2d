//! Request identity (§3 `Identity`, §6 inbound headers).
//!
//! `Identity` is immutable once extracted and is threaded through the pipeline,
//! orchestrator, router, and tool clients without further header parsing.

use base64::Engine;
use chrono::Utc;

#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub request_id: String,
    pub task_id: Option<String>,
    pub client_id: Option<String>,
    pub client_ide: String,
    pub client_os: Option<String>,
    pub client_version: Option<String>,
    pub project_path: Option<String>,
    pub auth_token: Option<String>,
    pub user_name: Option<String>,
    pub caller: String,
    pub accept_language: Option<String>,
}

impl Identity {
    pub fn builder() -> IdentityBuilder {
        IdentityBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct IdentityBuilder {
    request_id: Option<String>,
    task_id: Option<String>,
    client_id: Option<String>,
    client_ide: Option<String>,
    client_os: Option<String>,
    client_version: Option<String>,
    project_path_raw: Option<String>,
    auth_token: Option<String>,
    caller: Option<String>,
    accept_language: Option<String>,
}

/// Error surfaced by identity extraction: a malformed `x-request-id`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("x-request-id is not a valid UUID")]
    InvalidRequestId,
    #[error("x-request-id timestamp is outside the allowed window")]
    TimestampOutOfWindow,
}

impl IdentityBuilder {
    pub fn request_id(mut self, v: impl Into<String>) -> Self {
        self.request_id = Some(v.into());
        self
    }
    pub fn task_id(mut self, v: Option<String>) -> Self {
        self.task_id = v;
        self
    }
    pub fn client_id(mut self, v: Option<String>) -> Self {
        self.client_id = v;
        self
    }
    pub fn client_ide(mut self, v: Option<String>) -> Self {
        self.client_ide = v;
        self
    }
    pub fn client_os(mut self, v: Option<String>) -> Self {
        self.client_os = v;
        self
    }
    pub fn client_version(mut self, v: Option<String>) -> Self {
        self.client_version = v;
        self
    }
    pub fn project_path(mut self, v: Option<String>) -> Self {
        self.project_path_raw = v;
        self
    }
    pub fn auth_token(mut self, v: Option<String>) -> Self {
        self.auth_token = v;
        self
    }
    pub fn caller(mut self, v: Option<String>) -> Self {
        self.caller = v;
        self
    }
    pub fn accept_language(mut self, v: Option<String>) -> Self {
        self.accept_language = v;
        self
    }

    /// `enable_time_verify` gates the ±5-minute window check against the UUID
    /// v7 timestamp embedded in `x-request-id`.
    pub fn build(self, enable_time_verify: bool, time_window_secs: i64) -> Result<Identity, IdentityError> {
        let request_id = self.request_id.ok_or(IdentityError::InvalidRequestId)?;
        let uuid = uuid::Uuid::parse_str(&request_id).map_err(|_| IdentityError::InvalidRequestId)?;
        if uuid.get_version_num() != 7 {
            return Err(IdentityError::InvalidRequestId);
        }
        if enable_time_verify {
            if let Some((secs, _)) = uuid.get_timestamp().map(|ts| ts.to_unix()) {
                let now = Utc::now().timestamp();
                if (now - secs as i64).abs() > time_window_secs {
                    return Err(IdentityError::TimestampOutOfWindow);
                }
            }
        }
        let user_name = self
            .auth_token
            .as_deref()
            .and_then(decode_jwt_name_claim);
        Ok(Identity {
            request_id,
            task_id: self.task_id,
            client_id: self.client_id,
            client_ide: self.client_ide.unwrap_or_else(|| "vscode".to_string()),
            client_os: self.client_os,
            client_version: self.client_version,
            project_path: self.project_path_raw.map(|p| percent_decode(&p)),
            auth_token: self.auth_token,
            user_name,
            caller: self.caller.unwrap_or_else(|| "chat".to_string()),
            accept_language: self.accept_language,
        })
    }
}

/// Percent-decodes `zgsm-project-path`. Falls back to the raw value on malformed escapes.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&s[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| s.to_string())
}

/// Extracts the `name` claim from a bearer JWT's payload without verifying
/// the signature (signature verification policy is explicitly out of scope).
fn decode_jwt_name_claim(token: &str) -> Option<String> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token);
    let mut parts = token.split('.');
    let _header = parts.next()?;
    let payload = parts.next()?;
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    let value: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    value.get("name")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid_v7() -> String {
        uuid::Uuid::now_v7().to_string()
    }

    #[test]
    fn rejects_non_v7_request_id() {
        let id = uuid::Uuid::new_v4().to_string();
        let err = Identity::builder().request_id(id).build(false, 300).unwrap_err();
        assert_eq!(err, IdentityError::InvalidRequestId);
    }

    #[test]
    fn accepts_v7_request_id() {
        let identity = Identity::builder().request_id(uuid_v7()).build(false, 300).unwrap();
        assert!(!identity.request_id.is_empty());
    }

    #[test]
    fn defaults_caller_and_client_ide() {
        let identity = Identity::builder().request_id(uuid_v7()).build(false, 300).unwrap();
        assert_eq!(identity.caller, "chat");
        assert_eq!(identity.client_ide, "vscode");
    }

    #[test]
    fn percent_decodes_project_path() {
        let identity = Identity::builder()
            .request_id(uuid_v7())
            .project_path(Some("%2Fhome%2Fuser%2Fproj".to_string()))
            .build(false, 300)
            .unwrap();
        assert_eq!(identity.project_path.as_deref(), Some("/home/user/proj"));
    }

    #[test]
    fn decodes_name_claim_from_jwt() {
        let header = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"{\"alg\":\"none\"}");
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"{\"name\":\"alice\"}");
        let token = format!("{header}.{payload}.sig");
        let identity = Identity::builder()
            .request_id(uuid_v7())
            .auth_token(Some(token))
            .build(false, 300)
            .unwrap();
        assert_eq!(identity.user_name.as_deref(), Some("alice"));
    }
}
