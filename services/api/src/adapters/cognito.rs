//! services/api/src/adapters/cognito.rs
//!
//! This module contains the adapter for the Amazon Cognito user pool.
//! It implements the `CredentialExchange` port from the core crate.

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::{
    error::DisplayErrorContext, operation::admin_initiate_auth::AdminInitiateAuthError,
    types::AuthFlowType, Client,
};
use question_paper_core::domain::AuthTokens;
use question_paper_core::ports::{CredentialExchange, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that exchanges credentials using the admin no-SRP password flow.
#[derive(Clone)]
pub struct CognitoAdapter {
    client: Client,
    user_pool_id: String,
    client_id: String,
}

impl CognitoAdapter {
    /// Creates a new `CognitoAdapter`.
    pub fn new(client: Client, user_pool_id: String, client_id: String) -> Self {
        Self {
            client,
            user_pool_id,
            client_id,
        }
    }
}

//=========================================================================================
// `CredentialExchange` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialExchange for CognitoAdapter {
    async fn authenticate(&self, username: &str, password: &str) -> PortResult<AuthTokens> {
        let output = self
            .client
            .admin_initiate_auth()
            .user_pool_id(&self.user_pool_id)
            .client_id(&self.client_id)
            .auth_flow(AuthFlowType::AdminNoSrpAuth)
            .auth_parameters("USERNAME", username)
            .auth_parameters("PASSWORD", password)
            .send()
            .await
            .map_err(|e| {
                let message = match e.as_service_error() {
                    Some(AdminInitiateAuthError::NotAuthorizedException(_)) => {
                        "Incorrect username or password".to_string()
                    }
                    Some(AdminInitiateAuthError::UserNotFoundException(_)) => {
                        "User does not exist".to_string()
                    }
                    _ => format!("Authentication error: {}", DisplayErrorContext(&e)),
                };
                PortError::AuthenticationFailed(message)
            })?;

        // A challenge (e.g. a forced password change) arrives without tokens.
        let result = output.authentication_result().ok_or_else(|| {
            PortError::AuthenticationFailed(format!(
                "Authentication error: challenge {:?} must be completed first",
                output.challenge_name()
            ))
        })?;

        let token = |value: Option<&str>, name: &str| {
            value.map(str::to_string).ok_or_else(|| {
                PortError::AuthenticationFailed(format!("Authentication error: no {name} issued"))
            })
        };

        Ok(AuthTokens {
            access_token: token(result.access_token(), "access token")?,
            id_token: token(result.id_token(), "ID token")?,
            refresh_token: token(result.refresh_token(), "refresh token")?,
            expires_in: i64::from(result.expires_in()),
        })
    }
}
