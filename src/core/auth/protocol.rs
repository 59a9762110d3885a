use serde::{Deserialize, Serialize};

use crate::core::error::AuthError;

/// Client identifier the authentication server expects on every request.
pub const CLIENT_IDENTIFIER: &str = "TLauncher/2.0 (Java; Windows 10)";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub client_token: &'a str,
    pub request_user: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub selected_profile: Option<ProfileRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Fields of a successful exchange, all present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProfile {
    pub access_token: String,
    pub profile_id: String,
    pub profile_name: String,
}

impl AuthenticateResponse {
    pub fn parse(body: &[u8]) -> Result<ValidatedProfile, AuthError> {
        let response: AuthenticateResponse = serde_json::from_slice(body)
            .map_err(|err| AuthError::MalformedResponse(format!("invalid JSON: {err}")))?;
        response.validate()
    }

    fn validate(self) -> Result<ValidatedProfile, AuthError> {
        let access_token = non_empty(self.access_token)
            .ok_or_else(|| AuthError::MalformedResponse("missing accessToken".into()))?;
        let profile = self
            .selected_profile
            .ok_or_else(|| AuthError::MalformedResponse("missing selectedProfile".into()))?;
        let profile_id = non_empty(profile.id)
            .ok_or_else(|| AuthError::MalformedResponse("missing selectedProfile.id".into()))?;
        let profile_name = non_empty(profile.name)
            .ok_or_else(|| AuthError::MalformedResponse("missing selectedProfile.name".into()))?;

        Ok(ValidatedProfile {
            access_token,
            profile_id,
            profile_name,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_wire_field_names() {
        let request = AuthenticateRequest {
            username: "a@b.com",
            password: "pw",
            client_token: "token",
            request_user: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "username": "a@b.com",
                "password": "pw",
                "clientToken": "token",
                "requestUser": true
            })
        );
    }

    #[test]
    fn complete_response_validates() {
        let body = br#"{"accessToken":"tok","selectedProfile":{"id":"abc","name":"Steve"}}"#;
        let profile = AuthenticateResponse::parse(body).unwrap();
        assert_eq!(profile.access_token, "tok");
        assert_eq!(profile.profile_id, "abc");
        assert_eq!(profile.profile_name, "Steve");
    }

    #[test]
    fn partial_responses_are_malformed() {
        let bodies: [&[u8]; 5] = [
            br#"{"selectedProfile":{"id":"abc","name":"Steve"}}"#,
            br#"{"accessToken":"tok"}"#,
            br#"{"accessToken":"tok","selectedProfile":{"name":"Steve"}}"#,
            br#"{"accessToken":"","selectedProfile":{"id":"abc","name":"Steve"}}"#,
            b"not json",
        ];
        for body in bodies {
            assert!(matches!(
                AuthenticateResponse::parse(body),
                Err(AuthError::MalformedResponse(_))
            ));
        }
    }
}
