use serde::{Deserialize, Serialize};

/// The user behind the current session (`GET /auth/current-user`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub user_role: String,
}

/// Body of `POST /auth/token` and `POST /auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl From<TokenResponse> for crate::credentials::TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self {
            bearer_token: response.access_token,
            api_key: response.api_key,
            csrf_token: response.csrf_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::TokenSet;

    #[test]
    fn test_token_response_without_api_key() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"t1","token_type":"bearer","csrf_token":"c1"}"#,
        )
        .unwrap();
        let tokens = TokenSet::from(response);
        assert_eq!(tokens.bearer_token, "t1");
        assert_eq!(tokens.csrf_token.as_deref(), Some("c1"));
        assert_eq!(tokens.api_key, None);
    }
}
