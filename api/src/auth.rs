//! Authentication and account endpoints.
//!
//! Registration is a two-step OTP flow: `send_otp` mails a one-time code,
//! `verify_otp` trades the code plus the chosen password for a session.

use crate::{client::ApiClient, error::ApiError, types::UserProfile};
use serde::{Deserialize, Serialize};

/// Login request body
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Registration step one: request an OTP for a new account
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendOtpRequest {
    /// Email to register
    pub email: String,
    /// Display name for the new account
    pub name: String,
}

/// Registration step two: verify the OTP and create the account
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyOtpRequest {
    /// Email being registered
    pub email: String,
    /// Six-digit code from the registration mail
    pub otp: String,
    /// Chosen password
    pub password: String,
    /// Indian mobile number
    pub phone: String,
}

/// Successful authentication response: a session token plus the user it
/// belongs to, issued as one unit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    /// Opaque bearer token
    pub token: String,
    /// Authenticated user
    pub user: UserProfile,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordRequest<'a> {
    password: &'a str,
}

#[derive(Serialize)]
struct UpdateProfileRequest<'a> {
    name: &'a str,
    phone: &'a str,
}

#[derive(Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    user: Option<UserProfile>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when credentials are rejected.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/auth/login", &request, "auth.login").await
    }

    /// `POST /auth/send-otp`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when the backend rejects the
    /// registration request.
    pub async fn send_otp(&self, email: &str, name: &str) -> Result<(), ApiError> {
        let request = SendOtpRequest {
            email: email.to_string(),
            name: name.to_string(),
        };
        let _ack: serde_json::Value = self.post("/auth/send-otp", &request, "auth.send_otp").await?;
        Ok(())
    }

    /// `POST /auth/verify-otp`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when the OTP is invalid.
    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<AuthResponse, ApiError> {
        self.post("/auth/verify-otp", request, "auth.verify_otp")
            .await
    }

    /// `POST /auth/forgot-password`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when the backend rejects the
    /// request.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let request = ForgotPasswordRequest { email };
        let _ack: serde_json::Value = self
            .post("/auth/forgot-password", &request, "auth.forgot_password")
            .await?;
        Ok(())
    }

    /// `PUT /auth/reset-password/:token`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when the reset token has
    /// expired.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ApiError> {
        let request = ResetPasswordRequest { password };
        let path = format!("/auth/reset-password/{token}");
        let _ack: serde_json::Value = self.put(&path, &request, "auth.reset_password").await?;
        Ok(())
    }

    /// `PUT /auth/profile`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, or [`ApiError::Business`] when
    /// the backend reports `success: false`.
    pub async fn update_profile(&self, name: &str, phone: &str) -> Result<UserProfile, ApiError> {
        let request = UpdateProfileRequest { name, phone };
        let response: ProfileResponse = self
            .put("/auth/profile", &request, "auth.update_profile")
            .await?;

        if !response.success {
            return Err(ApiError::Business(response.message.unwrap_or_else(|| {
                "Failed to update profile".to_string()
            })));
        }

        response.user.ok_or_else(|| {
            ApiError::ResponseParse("profile update succeeded without a user".to_string())
        })
    }
}
