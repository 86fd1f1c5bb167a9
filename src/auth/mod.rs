//! Authentication and user management

mod session;
mod types;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;

pub use session::*;
pub use types::*;

/// Client for the hosted auth service
#[derive(Clone)]
pub struct Auth {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: Arc<Mutex<Option<Session>>>,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, key: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(Mutex::new(None)),
            options,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn session_guard(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, session: &Session) {
        if self.options.persist_session {
            *self.session_guard() = Some(session.clone());
        }
    }

    fn token(&self) -> Result<String, Error> {
        self.session_guard()
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or_else(|| Error::auth("Not logged in"))
    }

    /// Register a new account with its marketplace profile flags
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpResponse, Error> {
        let url = self.get_auth_url("/signup");
        let body = json!({
            "email": email,
            "password": password,
            "data": metadata,
        });

        let result = Fetch::post(&self.client, &url)
            .authorize(&self.key, &self.key)
            .json(&body)?
            .execute::<SignUpResponse>()
            .await?;

        if let SignUpResponse::Session(session) = &result {
            let session = session.clone().stamped();
            self.store(&session);
        }
        info!(confirmed = result.session().is_some(), "account created");

        Ok(result)
    }

    /// Sign in a user with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, Error> {
        let url = self.get_auth_url("/token?grant_type=password");
        let body = json!({ "email": email, "password": password });

        let session = Fetch::post(&self.client, &url)
            .authorize(&self.key, &self.key)
            .json(&body)?
            .execute::<Session>()
            .await?
            .stamped();

        self.store(&session);
        debug!("signed in");
        Ok(session)
    }

    /// Trade the refresh token for a new session
    pub async fn refresh_session(&self) -> Result<Session, Error> {
        let refresh_token = self
            .session_guard()
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or_else(|| Error::auth("Not logged in"))?;

        let url = self.get_auth_url("/token?grant_type=refresh_token");
        let session = Fetch::post(&self.client, &url)
            .authorize(&self.key, &self.key)
            .json(&json!({ "refresh_token": refresh_token }))?
            .execute::<Session>()
            .await?
            .stamped();

        self.store(&session);
        debug!("session refreshed");
        Ok(session)
    }

    /// Sign out the current user
    pub async fn sign_out(&self) -> Result<(), Error> {
        let url = self.get_auth_url("/logout");
        let token = self.token()?;

        Fetch::post(&self.client, &url)
            .authorize(&self.key, &token)
            .execute_empty()
            .await?;

        *self.session_guard() = None;
        info!("signed out");
        Ok(())
    }

    /// Send a password recovery mail
    pub async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), Error> {
        let mut url = self.get_auth_url("/recover");
        if let Some(redirect_to) = redirect_to {
            url.push_str(&format!("?redirect_to={}", urlencoding::encode(redirect_to)));
        }

        Fetch::post(&self.client, &url)
            .authorize(&self.key, &self.key)
            .json(&json!({ "email": email }))?
            .execute_empty()
            .await
    }

    /// The URL the browser is sent to for an OAuth login
    pub fn get_oauth_sign_in_url(
        &self,
        provider: OAuthProvider,
        options: Option<OAuthSignInOptions>,
    ) -> String {
        let options = options.unwrap_or_default();
        let mut url = format!("{}/auth/v1/authorize?provider={}", self.url, provider.as_str());

        if let Some(redirect_to) = options.redirect_to {
            url.push_str(&format!("&redirect_to={}", urlencoding::encode(&redirect_to)));
        }
        if let Some(scopes) = options.scopes {
            url.push_str(&format!("&scopes={}", urlencoding::encode(&scopes)));
        }

        url
    }

    /// Exchange a PKCE auth code from the OAuth callback for a session
    pub async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<Session, Error> {
        let url = self.get_auth_url("/token?grant_type=pkce");
        let session = Fetch::post(&self.client, &url)
            .authorize(&self.key, &self.key)
            .json(&json!({ "auth_code": auth_code, "code_verifier": code_verifier }))?
            .execute::<Session>()
            .await?
            .stamped();

        self.store(&session);
        Ok(session)
    }

    /// Adopt the session carried by an OAuth redirect URL
    pub fn set_session_from_url(&self, redirect: &str) -> Result<Session, Error> {
        let session = Session::from_redirect_url(redirect)?;
        self.set_session(session.clone());
        Ok(session)
    }

    /// Get the user data for the currently authenticated user
    pub async fn get_user(&self) -> Result<AuthUser, Error> {
        let url = self.get_auth_url("/user");
        let token = self.access_token().await?;

        Fetch::get(&self.client, &url)
            .authorize(&self.key, &token)
            .execute::<AuthUser>()
            .await
    }

    /// Update the user data
    pub async fn update(&self, attributes: &UserAttributes) -> Result<AuthUser, Error> {
        let url = self.get_auth_url("/user");
        let token = self.access_token().await?;

        Fetch::put(&self.client, &url)
            .authorize(&self.key, &token)
            .json(attributes)?
            .execute::<AuthUser>()
            .await
    }

    /// A valid access token, refreshing first when the session has run out
    pub async fn access_token(&self) -> Result<String, Error> {
        let expired = self
            .session_guard()
            .as_ref()
            .map(Session::is_expired)
            .ok_or_else(|| Error::auth("Not logged in"))?;

        if expired && self.options.auto_refresh_token {
            return Ok(self.refresh_session().await?.access_token);
        }
        self.token()
    }

    /// The token data requests go out with: the user's when signed in, the anon key otherwise
    pub async fn bearer(&self) -> Result<String, Error> {
        if self.get_session().is_none() {
            return Ok(self.key.clone());
        }
        self.access_token().await
    }

    /// The signed-in user's id
    pub fn current_user_id(&self) -> Option<String> {
        self.get_session().and_then(|s| s.user_id().ok())
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        self.session_guard().clone()
    }

    /// Set the session
    pub fn set_session(&self, session: Session) {
        *self.session_guard() = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> Auth {
        Auth::new(
            "https://demo.supabase.co",
            "anon",
            Client::new(),
            ClientOptions::default(),
        )
    }

    #[test]
    fn oauth_url_encodes_redirect() {
        let url = auth().get_oauth_sign_in_url(
            OAuthProvider::Google,
            Some(OAuthSignInOptions {
                redirect_to: Some("https://shop.example/auth/callback?next=/products".into()),
                ..Default::default()
            }),
        );
        assert_eq!(
            url,
            "https://demo.supabase.co/auth/v1/authorize?provider=google&redirect_to=https%3A%2F%2Fshop.example%2Fauth%2Fcallback%3Fnext%3D%2Fproducts"
        );
    }

    #[test]
    fn anonymous_bearer_is_the_project_key() {
        let auth = auth();
        let token = tokio_test::block_on(auth.bearer()).unwrap();
        assert_eq!(token, "anon");
        assert!(auth.current_user_id().is_none());
    }
}
