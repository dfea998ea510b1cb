use crate::api::ApiError;
use crate::routes::Route;
use crate::services::{LoginRequest, LoginResponse};

use super::cycle;
use super::input::TextInput;

pub const SIGNUP_NOTICE: &str = "Account created successfully. Please sign in.";
const LOGIN_FAILED: &str = "Login failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInField {
    Username,
    Password,
}

const FIELDS: [SignInField; 2] = [SignInField::Username, SignInField::Password];

#[derive(Debug, Default)]
pub struct SignIn {
    pub username: TextInput,
    pub password: TextInput,
    focus: usize,
    pub submitting: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl SignIn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notice(notice: impl Into<String>) -> Self {
        Self {
            notice: Some(notice.into()),
            ..Self::default()
        }
    }

    pub fn focus(&self) -> SignInField {
        FIELDS[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = cycle(self.focus, FIELDS.len(), true);
    }

    pub fn prev_field(&mut self) {
        self.focus = cycle(self.focus, FIELDS.len(), false);
    }

    /// The focused input. Editing clears a previous error.
    pub fn input_mut(&mut self) -> &mut TextInput {
        self.error = None;
        match self.focus() {
            SignInField::Username => &mut self.username,
            SignInField::Password => &mut self.password,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.username.is_blank() && !self.password.value().is_empty()
    }

    pub fn begin_submit(&mut self) -> Option<LoginRequest> {
        if !self.can_submit() {
            return None;
        }
        self.submitting = true;
        self.error = None;
        Some(LoginRequest {
            username: self.username.trimmed().to_string(),
            password: self.password.value().to_string(),
        })
    }

    pub fn finish_submit(&mut self, result: Result<LoginResponse, ApiError>) -> Option<Route> {
        self.submitting = false;
        match result {
            Ok(_) => Some(Route::Dashboard),
            Err(e) => {
                self.error = Some(e.user_message(LOGIN_FAILED));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::sample_user;
    use crate::services::tests::status_error;
    use reqwest::StatusCode;

    fn filled() -> SignIn {
        let mut form = SignIn::new();
        form.username.set("ada");
        form.password.set("secret");
        form
    }

    #[test]
    fn submit_requires_both_fields() {
        let mut form = SignIn::new();
        form.username.set("ada");
        assert!(form.begin_submit().is_none());
        form.password.set("pw");
        assert!(form.begin_submit().is_some());
        assert!(form.begin_submit().is_none(), "second submit while in flight");
    }

    #[test]
    fn success_goes_to_dashboard() {
        let mut form = filled();
        form.begin_submit().unwrap();
        let route = form.finish_submit(Ok(LoginResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            user: sample_user("ada"),
        }));
        assert_eq!(route, Some(Route::Dashboard));
        assert!(!form.submitting);
    }

    #[test]
    fn failure_shows_server_message_or_fallback() {
        let mut form = filled();
        form.begin_submit().unwrap();
        let route = form.finish_submit(Err(status_error(
            StatusCode::UNAUTHORIZED,
            Some("Invalid username or password"),
        )));
        assert_eq!(route, None);
        assert_eq!(form.error.as_deref(), Some("Invalid username or password"));

        form.begin_submit().unwrap();
        form.finish_submit(Err(status_error(StatusCode::BAD_GATEWAY, None)));
        assert_eq!(form.error.as_deref(), Some(LOGIN_FAILED));
        assert_eq!(form.password.value(), "secret", "draft kept for retry");
    }

    #[test]
    fn typing_clears_error() {
        let mut form = filled();
        form.error = Some("bad".into());
        form.next_field();
        assert_eq!(form.focus(), SignInField::Password);
        form.input_mut().insert('!');
        assert_eq!(form.error, None);
        assert_eq!(form.password.value(), "secret!");
    }
}
