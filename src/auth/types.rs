//! Types for authentication and user management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Session;

/// Response of the sign-up endpoint.
///
/// With email confirmation enabled the backend answers with the bare user,
/// otherwise it answers with a full session.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(Session),
    User(AuthUser),
}

impl SignUpResponse {
    /// The created user regardless of the response shape
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            SignUpResponse::Session(session) => session.user.as_ref(),
            SignUpResponse::User(user) => Some(user),
        }
    }

    /// The session, if the account is usable without email confirmation
    pub fn session(&self) -> Option<&Session> {
        match self {
            SignUpResponse::Session(session) => Some(session),
            SignUpResponse::User(_) => None,
        }
    }
}

/// User data as the auth service sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// The user ID
    pub id: String,

    /// The app metadata
    #[serde(default)]
    pub app_metadata: HashMap<String, serde_json::Value>,

    /// The user metadata, filled from [`SignUpMetadata`]
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,

    /// The user's email address
    pub email: Option<String>,

    /// When the email was confirmed
    pub email_confirmed_at: Option<String>,

    /// The user's phone number
    pub phone: Option<String>,

    /// The last sign-in time
    pub last_sign_in_at: Option<String>,

    /// The creation time
    pub created_at: Option<String>,

    /// The user's role
    pub role: Option<String>,
}

impl AuthUser {
    /// Read a boolean flag out of the user metadata
    pub fn metadata_flag(&self, key: &str) -> bool {
        self.user_metadata
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn is_supplier(&self) -> bool {
        self.metadata_flag("is_supplier")
    }
}

/// Profile data attached to an account when it is created
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignUpMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    pub is_supplier: bool,

    pub is_buyer: bool,
}

/// User attributes that can be updated
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserAttributes {
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// User metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// OAuth providers offered on the login screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Facebook,
    Apple,
    Azure,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Apple => "apple",
            Self::Azure => "azure",
        }
    }
}

/// OAuth sign-in settings
#[derive(Debug, Clone, Serialize, Default)]
pub struct OAuthSignInOptions {
    pub redirect_to: Option<String>,
    pub scopes: Option<String>,
}
