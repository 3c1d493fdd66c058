//! Authentication request and response types

use serde::{Deserialize, Serialize};

/// Username/password login body for `POST /auth/token/`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Account creation body for `POST /auth/register/`.
///
/// The password confirmation stays client-side; see
/// [`RegistrationForm`](crate::forms::RegistrationForm).
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// One-time passcode body for `POST /auth/verify-otp/`.
#[derive(Debug, Clone, Serialize)]
pub struct OtpVerification {
    pub email: String,
    pub otp: String,
}

/// Token returned by login and OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<u64>,
}

/// Current user as reported by `GET /auth/validate-token/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
}
