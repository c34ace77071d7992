//! Login, signup and logout.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::client::{ApiClient, ApiError, ApiRequest, ApiResult};
use crate::session::Session;

/// Role assigned when a signup form leaves it unset.
pub const DEFAULT_ROLE: &str = "student";

/// Registration details as entered by a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
    pub mobile_no: Option<String>,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            role: DEFAULT_ROLE.to_string(),
            mobile_no: None,
        }
    }
}

impl SignupForm {
    /// Checks required fields and the password confirmation, returning the
    /// form with text fields trimmed. Passwords are kept verbatim.
    ///
    /// # Errors
    /// Returns a validation error naming every missing field, or a
    /// password mismatch.
    pub fn validate(&self) -> ApiResult<SignupForm> {
        let form = SignupForm {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
            role: self.role.trim().to_string(),
            mobile_no: self
                .mobile_no
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        };

        let required = [
            ("username", &form.username),
            ("first_name", &form.first_name),
            ("last_name", &form.last_name),
            ("email", &form.email),
            ("password", &form.password),
            ("role", &form.role),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            let fields = missing
                .iter()
                .map(|name| {
                    (
                        (*name).to_string(),
                        vec!["This field is required.".to_string()],
                    )
                })
                .collect();
            return Err(ApiError::validation(
                format!(
                    "Please fill in all required fields: {}",
                    missing.join(", ")
                ),
                fields,
            ));
        }

        if form.password != form.confirm_password {
            return Err(ApiError::validation(
                "Passwords do not match",
                BTreeMap::from([(
                    "password2".to_string(),
                    vec!["Passwords do not match".to_string()],
                )]),
            ));
        }

        Ok(form)
    }

    fn to_json(&self) -> Value {
        json!({
            "username": self.username,
            "email": self.email,
            "role": self.role,
            "mobile_no": self.mobile_no,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "password": self.password,
            "password2": self.confirm_password,
        })
    }
}

fn non_empty_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Extracts a complete token pair from a login or signup response.
fn token_pair(body: &Value) -> Option<Session> {
    let access = non_empty_str(body, "access").or_else(|| non_empty_str(body, "token"))?;
    let refresh = non_empty_str(body, "refresh")?;
    Some(Session::new(access, refresh))
}

impl ApiClient {
    /// Exchanges credentials for a token pair and establishes the session.
    ///
    /// # Errors
    /// Returns the API failure unchanged, or "Invalid response from server"
    /// when the response lacks either token.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Session> {
        tracing::debug!(username, "logging in");
        let request = ApiRequest::post(
            "/token/",
            json!({ "username": username, "password": password }),
        )
        .public();

        let body: Value = self.send_json(request).await?;
        let session =
            token_pair(&body).ok_or_else(|| ApiError::invalid_response("Invalid response from server"))?;

        self.session().establish(session.clone());
        Ok(session)
    }

    /// Registers an account and establishes a session for it.
    ///
    /// Uses the tokens from the signup response when it carries a full
    /// pair, otherwise logs in with the submitted credentials.
    ///
    /// # Errors
    /// Returns local validation failures before any network call, then API
    /// failures unchanged.
    pub async fn signup(&self, form: &SignupForm) -> ApiResult<Session> {
        let form = form.validate()?;
        tracing::debug!(username = %form.username, role = %form.role, "signing up");

        let request = ApiRequest::post("/users/", form.to_json()).public();
        let body: Value = self.send_json(request).await?;

        if let Some(session) = token_pair(&body) {
            self.session().establish(session.clone());
            return Ok(session);
        }

        tracing::debug!("signup response carried no tokens, logging in");
        self.login(&form.username, &form.password).await
    }

    /// Ends the session. Never fails.
    pub fn logout(&self) {
        self.session().logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> SignupForm {
        SignupForm {
            username: "  alice ".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            password: " secret ".to_string(),
            confirm_password: " secret ".to_string(),
            ..SignupForm::default()
        }
    }

    #[test]
    fn test_validate_trims_text_fields_only() {
        let form = complete_form().validate().unwrap();
        assert_eq!(form.username, "alice");
        assert_eq!(form.password, " secret ");
        assert_eq!(form.role, DEFAULT_ROLE);
        assert_eq!(form.mobile_no, None);
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let form = SignupForm {
            username: "   ".to_string(),
            role: String::new(),
            ..complete_form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.kind, crate::client::ApiErrorKind::Validation);
        assert_eq!(
            err.message,
            "Please fill in all required fields: username, role"
        );
        assert!(err.fields.contains_key("username"));
    }

    #[test]
    fn test_validate_password_mismatch() {
        let form = SignupForm {
            confirm_password: "other".to_string(),
            ..complete_form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.message, "Passwords do not match");
    }

    #[test]
    fn test_signup_body_sends_password2() {
        let body = complete_form().validate().unwrap().to_json();
        assert_eq!(body["password2"], " secret ");
        assert_eq!(body["username"], "alice");
        assert!(body["mobile_no"].is_null());
    }

    #[test]
    fn test_token_pair_requires_both_tokens() {
        assert_eq!(
            token_pair(&json!({ "access": "A1", "refresh": "R1" })),
            Some(Session::new("A1", "R1"))
        );
        assert_eq!(
            token_pair(&json!({ "token": "A1", "refresh": "R1" })),
            Some(Session::new("A1", "R1"))
        );
        assert_eq!(token_pair(&json!({ "access": "A1" })), None);
        assert_eq!(token_pair(&json!({ "access": "", "refresh": "R1" })), None);
        assert_eq!(token_pair(&Value::Null), None);
    }
}
