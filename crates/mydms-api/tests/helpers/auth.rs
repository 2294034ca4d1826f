use jsonwebtoken::{encode, EncodingKey, Header};
use mydms_api::auth::Claims;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_ISSUER: &str = "login.example.com";
pub const TEST_COOKIE: &str = "login_token";
pub const TEST_LOGIN_REDIRECT: &str = "https://login.example.com/?redirect=mydms";
pub const TEST_CLAIM_NAME: &str = "mydms";
pub const TEST_CLAIM_URL: &str = "https://mydms.example.com";

pub fn claims(roles: &[&str], exp: i64) -> Claims {
    Claims {
        token_type: "login.User".to_string(),
        user_name: "alice".to_string(),
        email: "alice@example.com".to_string(),
        user_id: "4711".to_string(),
        display_name: "Alice Example".to_string(),
        given_name: "Alice".to_string(),
        surname: "Example".to_string(),
        claims: roles
            .iter()
            .map(|role| format!("{}|{}|{}", TEST_CLAIM_NAME, TEST_CLAIM_URL, role))
            .collect(),
        iss: TEST_ISSUER.to_string(),
        exp,
    }
}

pub fn sign(claims: &Claims) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Token for a user holding the `user` role, valid for an hour
pub fn valid_token() -> String {
    sign(&claims(&["user"], chrono::Utc::now().timestamp() + 3600))
}
