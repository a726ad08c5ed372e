//! Authentication flows: login, signup, password recovery, OTP verification.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::classify::{classify_rejection, needs_verification, MessageTable, ServiceError};
use crate::client::{DispatchError, PortalClient};
use crate::http::{ApiRequest, Method, StatusCode};
use crate::service::validate;
use crate::session::keys;

const LOGIN: MessageTable = MessageTable::new(
    "login",
    &[
        (401, "Invalid email/phone or password"),
        (404, "User not found"),
        (422, "Login details failed validation. Please check your input."),
        (500, "Something went wrong on our end. Please try again later."),
    ],
    "Unable to sign in. Please try again.",
);

const SIGNUP: MessageTable = MessageTable::new(
    "signup",
    &[
        (
            409,
            "An account with this email or phone number already exists",
        ),
        (422, "Signup details failed validation. Please check your input."),
        (500, "Something went wrong on our end. Please try again later."),
    ],
    "Unable to create your account. Please try again.",
);

const FORGOT_PASSWORD: MessageTable = MessageTable::new(
    "forgot-password",
    &[(404, "No account found for that email address")],
    "Unable to send the reset email. Please try again.",
);

const RESET_PASSWORD: MessageTable = MessageTable::new(
    "reset-password",
    &[
        (401, "The reset link has expired. Please request a new one."),
        (422, "The reset link is invalid. Please request a new one."),
    ],
    "Unable to reset your password. Please try again.",
);

const VERIFY_ACCOUNT: MessageTable = MessageTable::new(
    "verify-account",
    &[
        (401, "The OTP code is incorrect or has expired"),
        (404, "User not found"),
    ],
    "Unable to verify your account. Please try again.",
);

const RESEND_OTP: MessageTable = MessageTable::new(
    "resend-otp",
    &[],
    "Unable to resend the code. Please try again.",
);

/// Login input, echoed back on the not-verified escape hatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    /// Email address or phone number.
    pub identifier: String,
    pub password: String,
}

/// Signup input. Every field is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub company_name: String,
    pub full_name: String,
    pub msisdn: String,
    pub email: String,
    pub country_code: String,
    pub address: String,
    pub password: String,
}

/// Session payload returned by a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default)]
    pub user: serde_json::Value,
}

/// Authentication service.
pub struct AuthService {
    client: Arc<PortalClient>,
}

impl AuthService {
    /// Create an authentication service over a portal client.
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }

    /// Sign in and persist the returned session state.
    ///
    /// A 422 whose message indicates a pending verification raises
    /// [`ServiceError::AccountNotVerified`] carrying the original
    /// credentials, so the caller can enter the OTP flow directly.
    pub async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, ServiceError> {
        validate::require(&credentials.identifier, "Email or phone number is required.")?;
        validate::require(&credentials.password, "Password is required.")?;

        let request = ApiRequest::new(Method::Post, "/auth/login")
            .json(&credentials)
            .map_err(|err| envelope_error(&LOGIN, err))?;

        match self.client.send(request).await {
            Ok(response) => {
                let session: AuthSession = decode(&LOGIN, response.data())?;
                self.persist_session(&session).await;
                Ok(session)
            }
            Err(err) => {
                if err.status() == Some(StatusCode::UNPROCESSABLE_ENTITY) {
                    if let Some(message) = err.server_message() {
                        if needs_verification(&message) {
                            debug!("login rejected pending OTP verification");
                            let store = self.client.store();
                            if let Err(store_err) = store
                                .set(keys::VERIFICATION_PENDING, &credentials.identifier)
                                .await
                            {
                                warn!(error = %store_err, "failed to record pending verification");
                            }
                            return Err(ServiceError::AccountNotVerified {
                                message,
                                credentials,
                            });
                        }
                    }
                }
                Err(classify_rejection(err, &LOGIN))
            }
        }
    }

    /// Register a new account.
    pub async fn signup(&self, request: SignupRequest) -> Result<(), ServiceError> {
        validate_signup(&request)?;

        let envelope = ApiRequest::new(Method::Post, "/auth/signup")
            .json(&request)
            .map_err(|err| envelope_error(&SIGNUP, err))?;

        match self.client.send(envelope).await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_rejection(err, &SIGNUP)),
        }
    }

    /// Request a password-reset email.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ServiceError> {
        validate::require(email, "Email address is required.")?;
        validate::email(email)?;

        let request = ApiRequest::new(Method::Post, "/auth/forgot-password")
            .body(serde_json::json!({ "email": email }));

        match self.client.send(request).await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_rejection(err, &FORGOT_PASSWORD)),
        }
    }

    /// Complete a password reset.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ServiceError> {
        validate::require(token, "Reset token is missing.")?;
        validate::min_password(password, 6)?;

        let request = ApiRequest::new(Method::Post, "/auth/reset-password")
            .body(serde_json::json!({ "token": token, "password": password }));

        match self.client.send(request).await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_rejection(err, &RESET_PASSWORD)),
        }
    }

    /// Submit the OTP code for a pending account.
    pub async fn verify_account(&self, identifier: &str, code: &str) -> Result<(), ServiceError> {
        validate::require(identifier, "Email or phone number is required.")?;
        validate::require(code, "The OTP code is required.")?;

        let request = ApiRequest::new(Method::Post, "/auth/verify-otp")
            .body(serde_json::json!({ "identifier": identifier, "otp": code }));

        match self.client.send(request).await {
            Ok(_) => {
                let store = self.client.store();
                if let Err(err) = store.remove(keys::VERIFICATION_PENDING).await {
                    warn!(error = %err, "failed to clear pending verification marker");
                }
                Ok(())
            }
            Err(err) => Err(classify_rejection(err, &VERIFY_ACCOUNT)),
        }
    }

    /// Ask the backend to resend the OTP code.
    pub async fn resend_otp(&self, identifier: &str) -> Result<(), ServiceError> {
        validate::require(identifier, "Email or phone number is required.")?;

        let request = ApiRequest::new(Method::Post, "/auth/resend-otp")
            .body(serde_json::json!({ "identifier": identifier }));

        match self.client.send(request).await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_rejection(err, &RESEND_OTP)),
        }
    }

    /// Sign out: best-effort server call, then clear local session state.
    pub async fn logout(&self) -> Result<(), ServiceError> {
        let store = self.client.store();
        if let Some(token) = store.get(keys::AUTH_TOKEN).await {
            let request = ApiRequest::new(Method::Post, "/auth/logout").bearer(token);
            if let Err(err) = self.client.send(request).await {
                debug!(error = %err, "logout call failed, clearing local session anyway");
            }
        }
        store
            .clear()
            .await
            .map_err(|_| ServiceError::Other("Unable to sign out. Please try again.".to_string()))
    }

    async fn persist_session(&self, session: &AuthSession) {
        let store = self.client.store();
        if let Err(err) = store.set(keys::AUTH_TOKEN, &session.token).await {
            warn!(error = %err, "failed to persist auth token");
        }
        if let Some(api_key) = &session.api_key {
            if let Err(err) = store.set(keys::API_KEY, api_key).await {
                warn!(error = %err, "failed to persist api key");
            }
        }
        let is_super_admin = if session.is_super_admin { "true" } else { "false" };
        if let Err(err) = store.set(keys::IS_SUPER_ADMIN, is_super_admin).await {
            warn!(error = %err, "failed to persist admin flag");
        }
        if !session.user.is_null() {
            match serde_json::to_string(&session.user) {
                Ok(user) => {
                    if let Err(err) = store.set(keys::USER_SESSION, &user).await {
                        warn!(error = %err, "failed to persist user session");
                    }
                }
                Err(err) => error!(error = %err, "failed to serialize user session"),
            }
        }
        let _ = store.remove(keys::VERIFICATION_PENDING).await;
    }
}

fn validate_signup(request: &SignupRequest) -> Result<(), ServiceError> {
    validate::require(&request.company_name, "Company name is required.")?;
    validate::require(&request.full_name, "Full name is required.")?;
    validate::require(&request.msisdn, "Phone number is required.")?;
    validate::require(&request.email, "Email address is required.")?;
    validate::require(&request.country_code, "Country code is required.")?;
    validate::require(&request.address, "Address is required.")?;
    validate::require(&request.password, "Password is required.")?;
    validate::email(&request.email)?;
    validate::msisdn_prefix(&request.msisdn)?;
    Ok(())
}

/// Map a serialization failure through the operation's table.
fn envelope_error(table: &MessageTable, err: serde_json::Error) -> ServiceError {
    classify_rejection(
        DispatchError::Local {
            message: err.to_string(),
        },
        table,
    )
}

/// Decode a success payload, wrapping failures in the operation fallback.
fn decode<T>(
    table: &MessageTable,
    data: Option<Result<T, serde_json::Error>>,
) -> Result<T, ServiceError> {
    match data {
        Some(Ok(value)) => Ok(value),
        Some(Err(err)) => {
            error!(operation = table.operation, error = %err, "failed to decode response payload");
            Err(ServiceError::Other(table.fallback.to_string()))
        }
        None => Err(ServiceError::Other(table.fallback.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockTransport;
    use crate::client::ClientConfig;
    use crate::session::{MemoryStore, SessionStore};

    fn signup_input() -> SignupRequest {
        SignupRequest {
            company_name: "Acme Ltd".to_string(),
            full_name: "Jordan Ops".to_string(),
            msisdn: "+254700000001".to_string(),
            email: "ops@example.com".to_string(),
            country_code: "KE".to_string(),
            address: "P.O. Box 100".to_string(),
            password: "hunter2!".to_string(),
        }
    }

    fn service(transport: Arc<MockTransport>) -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(PortalClient::with_transport(
            ClientConfig::new().base_url("http://api.local"),
            store.clone(),
            transport,
        ));
        (AuthService::new(client), store)
    }

    #[tokio::test]
    async fn signup_with_missing_field_fails_before_any_request() {
        let transport = MockTransport::new();
        let (auth, _) = service(transport.clone());

        let mut input = signup_input();
        input.company_name = String::new();

        let err = auth.signup(input).await.unwrap_err();
        assert_eq!(err.to_string(), "Company name is required.");
        assert_eq!(transport.call_count().await, 0);
    }

    #[tokio::test]
    async fn signup_with_malformed_email_fails_before_any_request() {
        let transport = MockTransport::new();
        let (auth, _) = service(transport.clone());

        let mut input = signup_input();
        input.email = "not-an-email".to_string();

        let err = auth.signup(input).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address.");
        assert_eq!(transport.call_count().await, 0);
    }

    #[tokio::test]
    async fn signup_without_plus_prefix_fails_before_any_request() {
        let transport = MockTransport::new();
        let (auth, _) = service(transport.clone());

        let mut input = signup_input();
        input.msisdn = "0700000001".to_string();

        let err = auth.signup(input).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Phone number must start with '+' followed by the country code."
        );
        assert_eq!(transport.call_count().await, 0);
    }

    #[tokio::test]
    async fn valid_signup_posts_to_the_signup_endpoint() {
        let transport = MockTransport::new();
        transport.push_ok(201, r#"{"message":"created"}"#).await;
        let (auth, _) = service(transport.clone());

        auth.signup(signup_input()).await.unwrap();

        let calls = transport.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::Post);
        assert_eq!(calls[0].url, "http://api.local/auth/signup");
    }

    #[tokio::test]
    async fn login_success_persists_session_state() {
        let transport = MockTransport::new();
        transport
            .push_ok(
                200,
                r#"{"token":"tok_1","api_key":"key_1","is_super_admin":true,"user":{"id":7}}"#,
            )
            .await;
        let (auth, store) = service(transport);

        let session = auth
            .login(LoginCredentials {
                identifier: "ops@example.com".to_string(),
                password: "hunter2!".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.token, "tok_1");
        assert_eq!(store.get(keys::AUTH_TOKEN).await, Some("tok_1".to_string()));
        assert_eq!(store.get(keys::API_KEY).await, Some("key_1".to_string()));
        assert_eq!(
            store.get(keys::IS_SUPER_ADMIN).await,
            Some("true".to_string())
        );
        assert!(store.get(keys::USER_SESSION).await.is_some());
    }

    #[tokio::test]
    async fn login_unauthorized_maps_the_table_message() {
        let transport = MockTransport::new();
        transport
            .push_ok(401, r#"{"message":"bad password"}"#)
            .await;
        let (auth, _) = service(transport);

        let err = auth
            .login(LoginCredentials {
                identifier: "ops@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid email/phone or password");
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn login_not_found_maps_the_table_message() {
        let transport = MockTransport::new();
        transport.push_ok(404, "{}").await;
        let (auth, _) = service(transport);

        let err = auth
            .login(LoginCredentials {
                identifier: "ghost@example.com".to_string(),
                password: "hunter2!".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "User not found");
    }

    #[tokio::test]
    async fn unverified_login_carries_the_original_credentials() {
        let transport = MockTransport::new();
        transport
            .push_ok(
                422,
                r#"{"message":"Account is not verified. OTP code sent to your phone."}"#,
            )
            .await;
        let (auth, store) = service(transport);

        let credentials = LoginCredentials {
            identifier: "new@example.com".to_string(),
            password: "hunter2!".to_string(),
        };
        let err = auth.login(credentials.clone()).await.unwrap_err();

        assert!(err.is_account_not_verified());
        match err {
            ServiceError::AccountNotVerified {
                credentials: carried,
                ..
            } => assert_eq!(carried, credentials),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            store.get(keys::VERIFICATION_PENDING).await,
            Some("new@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn ordinary_unprocessable_login_uses_the_table_message() {
        let transport = MockTransport::new();
        transport
            .push_ok(422, r#"{"message":"identifier must be a string"}"#)
            .await;
        let (auth, _) = service(transport);

        let err = auth
            .login(LoginCredentials {
                identifier: "ops@example.com".to_string(),
                password: "hunter2!".to_string(),
            })
            .await
            .unwrap_err();

        assert!(!err.is_account_not_verified());
        assert_eq!(
            err.to_string(),
            "Login details failed validation. Please check your input."
        );
    }

    #[tokio::test]
    async fn reset_password_enforces_minimum_length() {
        let transport = MockTransport::new();
        let (auth, _) = service(transport.clone());

        let err = auth.reset_password("reset-token", "short").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Password must be at least 6 characters long."
        );
        assert_eq!(transport.call_count().await, 0);
    }

    #[tokio::test]
    async fn forgot_password_requires_a_valid_email() {
        let transport = MockTransport::new();
        let (auth, _) = service(transport.clone());

        let err = auth.forgot_password("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address.");
        assert_eq!(transport.call_count().await, 0);
    }

    #[tokio::test]
    async fn logout_clears_the_store_even_when_the_server_call_fails() {
        let transport = MockTransport::new();
        transport
            .push_err(DispatchError::NoResponse {
                message: "down".to_string(),
            })
            .await;
        let (auth, store) = service(transport);
        store.set(keys::AUTH_TOKEN, "tok_1").await.unwrap();

        auth.logout().await.unwrap();
        assert!(store.is_empty().await);
    }
}
