use crate::api::ApiError;
use crate::model::user::User;
use crate::routes::Route;
use crate::services::RegisterRequest;

use super::cycle;
use super::input::TextInput;

const PASSWORD_MISMATCH: &str = "Passwords do not match";
const REGISTER_FAILED: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpField {
    FirstName,
    LastName,
    Username,
    Email,
    Password,
    ConfirmPassword,
}

impl SignUpField {
    pub const ALL: [SignUpField; 6] = [
        SignUpField::FirstName,
        SignUpField::LastName,
        SignUpField::Username,
        SignUpField::Email,
        SignUpField::Password,
        SignUpField::ConfirmPassword,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SignUpField::FirstName => "First Name",
            SignUpField::LastName => "Last Name",
            SignUpField::Username => "Username *",
            SignUpField::Email => "Email *",
            SignUpField::Password => "Password *",
            SignUpField::ConfirmPassword => "Confirm Password *",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, SignUpField::Password | SignUpField::ConfirmPassword)
    }
}

#[derive(Debug, Default)]
pub struct SignUp {
    inputs: [TextInput; 6],
    focus: usize,
    pub submitting: bool,
    pub error: Option<String>,
}

impl SignUp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> SignUpField {
        SignUpField::ALL[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = cycle(self.focus, SignUpField::ALL.len(), true);
    }

    pub fn prev_field(&mut self) {
        self.focus = cycle(self.focus, SignUpField::ALL.len(), false);
    }

    pub fn input(&self, field: SignUpField) -> &TextInput {
        &self.inputs[field as usize]
    }

    pub fn field_mut(&mut self, field: SignUpField) -> &mut TextInput {
        self.error = None;
        &mut self.inputs[field as usize]
    }

    pub fn input_mut(&mut self) -> &mut TextInput {
        self.field_mut(self.focus())
    }

    fn optional(&self, field: SignUpField) -> Option<String> {
        let value = self.input(field).trimmed();
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting
            && !self.input(SignUpField::Username).is_blank()
            && !self.input(SignUpField::Email).is_blank()
            && !self.input(SignUpField::Password).value().is_empty()
    }

    /// Validates locally; a mismatch sets the error and yields no request.
    pub fn begin_submit(&mut self) -> Option<RegisterRequest> {
        if !self.can_submit() {
            return None;
        }
        let password = self.input(SignUpField::Password).value().to_string();
        if password != self.input(SignUpField::ConfirmPassword).value() {
            self.error = Some(PASSWORD_MISMATCH.to_string());
            return None;
        }
        self.submitting = true;
        self.error = None;
        Some(RegisterRequest {
            username: self.input(SignUpField::Username).trimmed().to_string(),
            email: self.input(SignUpField::Email).trimmed().to_string(),
            password,
            first_name: self.optional(SignUpField::FirstName),
            last_name: self.optional(SignUpField::LastName),
        })
    }

    pub fn finish_submit(&mut self, result: Result<User, ApiError>) -> Option<Route> {
        self.submitting = false;
        match result {
            Ok(user) => {
                tracing::info!(username = %user.username, "Account registered");
                Some(Route::SignIn)
            }
            Err(e) => {
                self.error = Some(e.user_message(REGISTER_FAILED));
                None
            }
        }
    }
}
