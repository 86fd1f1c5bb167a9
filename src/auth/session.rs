//! Session management for authentication

use std::collections::HashSet;

use chrono::Utc;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use url::Url;

use super::AuthUser;
use crate::error::Error;

/// Refresh this many seconds before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 10;

/// Session data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The token type
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// The lifetime in seconds
    pub expires_in: i64,

    /// The expiry timestamp
    pub expires_at: Option<i64>,

    /// The signed-in user
    pub user: Option<AuthUser>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// The claims we read out of the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub exp: Option<i64>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Session {
    /// Create a new session
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_in,
            expires_at: Some(Utc::now().timestamp() + expires_in),
            user: None,
        }
    }

    /// Fill in `expires_at` when the backend only sent `expires_in`
    pub(crate) fn stamped(mut self) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = Some(Utc::now().timestamp() + self.expires_in);
        }
        self
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() + EXPIRY_MARGIN_SECS >= expires_at,
            None => false,
        }
    }

    /// Decode the access token claims.
    ///
    /// The signature is not checked; the backend does that on every request.
    pub fn claims(&self) -> Result<AccessClaims, Error> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<AccessClaims>(
            &self.access_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;
        Ok(data.claims)
    }

    /// The signed-in user's id, from the embedded user or the token subject
    pub fn user_id(&self) -> Result<String, Error> {
        if let Some(user) = &self.user {
            return Ok(user.id.clone());
        }
        Ok(self.claims()?.sub)
    }

    /// Read a session out of an OAuth redirect such as
    /// `https://shop.example/auth/callback#access_token=…&refresh_token=…&expires_in=3600`
    pub fn from_redirect_url(redirect: &str) -> Result<Self, Error> {
        let url = Url::parse(redirect)?;
        let fragment = url.fragment().unwrap_or_default();
        let mut access_token = None;
        let mut refresh_token = None;
        let mut expires_in = None;
        let mut expires_at = None;
        let mut error = None;

        let pairs = url::form_urlencoded::parse(fragment.as_bytes())
            .chain(url.query_pairs());
        for (key, value) in pairs {
            match key.as_ref() {
                "access_token" => access_token = Some(value.into_owned()),
                "refresh_token" => refresh_token = Some(value.into_owned()),
                "expires_in" => expires_in = value.parse().ok(),
                "expires_at" => expires_at = value.parse().ok(),
                "error_description" => error = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            return Err(Error::auth(error));
        }

        match (access_token, refresh_token) {
            (Some(access_token), Some(refresh_token)) => {
                let mut session =
                    Session::new(access_token, refresh_token, expires_in.unwrap_or(3600));
                if expires_at.is_some() {
                    session.expires_at = expires_at;
                }
                Ok(session)
            }
            _ => Err(Error::auth("redirect URL carries no session")),
        }
    }
}
