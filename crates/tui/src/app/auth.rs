//! Login, sign-up and account screens.

use std::{fs, path::Path};

use api_types::{
    auth::{PasswordChange, SignIn, SignUp},
    user::User,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use client::{Backend, ClientError};

use crate::{
    app::{
        error_message,
        form::{Errors, Form, SubmitOutcome, Values},
        validate::Rule,
    },
    error::{AppError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub secret: bool,
    pub rules: &'static [Rule],
}

const fn field(name: &'static str, label: &'static str, rules: &'static [Rule]) -> FormField {
    FormField {
        name,
        label,
        secret: false,
        rules,
    }
}

const fn secret(name: &'static str, label: &'static str, rules: &'static [Rule]) -> FormField {
    FormField {
        name,
        label,
        secret: true,
        rules,
    }
}

pub const LOGIN_FIELDS: &[FormField] = &[
    field("email", "Email", &[Rule::Required, Rule::Email]),
    secret("password", "Password", &[Rule::Required]),
];

pub const SIGNUP_FIELDS: &[FormField] = &[
    field("first_name", "First name", &[Rule::Required, Rule::MaxLength(150)]),
    field("last_name", "Last name", &[Rule::Required, Rule::MaxLength(150)]),
    field("email", "Email", &[Rule::Required, Rule::Email]),
    field("username", "Username", &[Rule::Required, Rule::MaxLength(150)]),
    secret("password", "Password", &[Rule::Required, Rule::MinLength(8)]),
];

pub const PASSWORD_FIELDS: &[FormField] = &[
    secret("current_password", "Current password", &[Rule::Required]),
    secret("new_password", "New password", &[Rule::Required, Rule::MinLength(8)]),
    secret("repeat_password", "Repeat password", &[Rule::Required]),
];

pub const AVATAR_FIELDS: &[FormField] = &[field("path", "Image file", &[Rule::Required])];

/// A [`Form`] laid out as a vertical list of fields with one focused.
#[derive(Debug, Clone)]
pub struct FieldForm {
    form: Form,
    fields: &'static [FormField],
    focus: usize,
    message: Option<String>,
}

impl FieldForm {
    pub fn new(fields: &'static [FormField]) -> Self {
        let mut form = Form::new(fields.iter().map(|field| (field.name, String::new())));
        for field in fields {
            form.set_rules(field.name, field.rules);
        }
        Self {
            form,
            fields,
            focus: 0,
            message: None,
        }
    }

    /// Starts with `value` in `field`, also restored by a reset.
    pub fn with_initial(mut self, field: &'static str, value: &str) -> Self {
        let mut values = self.form.values().clone();
        values.insert(field, value.to_string());
        self.form.set_initial(values);
        self
    }

    pub fn fields(&self) -> &'static [FormField] {
        self.fields
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused(&self) -> &'static FormField {
        &self.fields[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.form.touch(self.focused().name);
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn push_char(&mut self, ch: char) {
        self.form.push_char(self.focused().name, ch);
    }

    pub fn pop_char(&mut self) {
        self.form.pop_char(self.focused().name);
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    fn fail(&mut self, action: &str, err: ClientError) {
        tracing::warn!(error = %err, "failed to {action}");
        self.message = Some(error_message(action, &err));
    }
}

fn passwords_match(values: &Values) -> Errors {
    let mut errors = Errors::new();
    if values.get("new_password") != values.get("repeat_password") {
        errors.insert("repeat_password", "passwords do not match".to_string());
    }
    errors
}

fn login_message(err: &ClientError) -> String {
    match err {
        ClientError::Unauthorized | ClientError::Forbidden => "wrong email or password".to_string(),
        _ => error_message("log in", err),
    }
}

#[derive(Debug, Clone)]
pub struct LoginState {
    pub form: FieldForm,
}

impl LoginState {
    pub fn new(email: &str) -> Self {
        Self {
            form: FieldForm::new(LOGIN_FIELDS).with_initial("email", email),
        }
    }

    /// Returns the token on success.
    pub async fn sign_in<B: Backend>(&mut self, api: &B) -> Option<String> {
        let outcome = self
            .form
            .form_mut()
            .submit(|values| async move {
                let payload = SignIn {
                    email: values["email"].trim().to_string(),
                    password: values["password"].clone(),
                };
                api.signin(&payload).await.map(|token| token.auth_token)
            })
            .await;

        match outcome {
            SubmitOutcome::Submitted(token) => {
                self.form.clear_message();
                Some(token)
            }
            SubmitOutcome::Failed(err) => {
                tracing::warn!(error = %err, "failed to log in");
                self.form.set_message(login_message(&err));
                None
            }
            SubmitOutcome::Invalid | SubmitOutcome::Busy => None,
        }
    }

    /// Asks the server to mail a reset link to the typed email.
    pub async fn reset_password<B: Backend>(&mut self, api: &B) {
        let email = self.form.form().value("email").trim().to_string();
        if let Some(message) = Rule::Required
            .check(&email)
            .or_else(|| Rule::Email.check(&email))
        {
            self.form.set_message(format!("email: {message}"));
            return;
        }
        match api.reset_password(&email).await {
            Ok(()) => self.form.set_message("check your inbox for a reset link"),
            Err(err) => self.form.fail("request a password reset", err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignUpState {
    pub form: FieldForm,
}

impl Default for SignUpState {
    fn default() -> Self {
        Self {
            form: FieldForm::new(SIGNUP_FIELDS),
        }
    }
}

impl SignUpState {
    /// Returns `true` once the account exists; the caller then shows login.
    pub async fn sign_up<B: Backend>(&mut self, api: &B) -> bool {
        let outcome = self
            .form
            .form_mut()
            .submit(|values| async move {
                let text = |name: &str| values[name].trim().to_string();
                let payload = SignUp {
                    email: text("email"),
                    username: text("username"),
                    first_name: text("first_name"),
                    last_name: text("last_name"),
                    password: values["password"].clone(),
                };
                api.signup(&payload).await
            })
            .await;

        match outcome {
            SubmitOutcome::Submitted(user) => {
                tracing::info!(user = %user.username, "account created");
                self.form.clear_message();
                true
            }
            SubmitOutcome::Failed(err) => {
                self.form.fail("sign up", err);
                false
            }
            SubmitOutcome::Invalid | SubmitOutcome::Busy => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountPanel {
    Password,
    Avatar,
}

#[derive(Debug, Clone)]
pub struct AccountState {
    user: Option<User>,
    /// Panel whose form currently takes keyboard input.
    pub editing: Option<AccountPanel>,
    pub password: FieldForm,
    pub avatar: FieldForm,
    error: Option<String>,
}

impl Default for AccountState {
    fn default() -> Self {
        let mut password = FieldForm::new(PASSWORD_FIELDS);
        password.form = password.form.with_check(passwords_match);
        Self {
            user: None,
            editing: None,
            password,
            avatar: FieldForm::new(AVATAR_FIELDS),
            error: None,
        }
    }
}

impl AccountState {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn start_editing(&mut self, panel: AccountPanel) {
        self.editing = Some(panel);
        if let Some(form) = self.active_form_mut() {
            form.clear_message();
        }
    }

    pub fn stop_editing(&mut self) {
        if let Some(form) = self.active_form_mut() {
            form.form_mut().reset();
        }
        self.editing = None;
    }

    pub fn active_form_mut(&mut self) -> Option<&mut FieldForm> {
        match self.editing? {
            AccountPanel::Password => Some(&mut self.password),
            AccountPanel::Avatar => Some(&mut self.avatar),
        }
    }

    pub async fn load<B: Backend>(&mut self, api: &B) {
        match api.me().await {
            Ok(user) => {
                self.user = Some(user);
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load profile");
                self.error = Some(error_message("load profile", &err));
            }
        }
    }

    pub async fn change_password<B: Backend>(&mut self, api: &B) -> bool {
        let outcome = self
            .password
            .form_mut()
            .submit(|values| async move {
                let payload = PasswordChange {
                    new_password: values["new_password"].clone(),
                    current_password: values["current_password"].clone(),
                };
                api.change_password(&payload).await
            })
            .await;

        match outcome {
            SubmitOutcome::Submitted(()) => {
                self.editing = None;
                self.password.set_message("password changed");
                true
            }
            SubmitOutcome::Failed(err) => {
                self.password.fail("change password", err);
                false
            }
            SubmitOutcome::Invalid | SubmitOutcome::Busy => false,
        }
    }

    pub async fn upload_avatar<B: Backend>(&mut self, api: &B) -> bool {
        let path = self.avatar.form().value("path").trim().to_string();
        if let Some(message) = Rule::Required.check(&path) {
            self.avatar.set_message(format!("path: {message}"));
            return false;
        }
        let data_uri = match avatar_data_uri(Path::new(&path)) {
            Ok(data_uri) => data_uri,
            Err(err) => {
                tracing::warn!(%path, error = %err, "failed to read avatar");
                self.avatar.set_message(err.to_string());
                return false;
            }
        };

        match api.set_avatar(&data_uri).await {
            Ok(avatar) => {
                if let Some(user) = self.user.as_mut() {
                    user.avatar = avatar.avatar;
                }
                self.avatar.form_mut().reset();
                self.editing = None;
                self.avatar.set_message("avatar updated");
                true
            }
            Err(err) => {
                self.avatar.fail("upload avatar", err);
                false
            }
        }
    }

    pub async fn delete_avatar<B: Backend>(&mut self, api: &B) -> bool {
        match api.delete_avatar().await {
            Ok(()) => {
                if let Some(user) = self.user.as_mut() {
                    user.avatar = None;
                }
                self.avatar.set_message("avatar removed");
                true
            }
            Err(err) => {
                self.avatar.fail("delete avatar", err);
                false
            }
        }
    }
}

/// Reads an image and encodes it as a `data:` URI.
pub fn avatar_data_uri(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return Err(AppError::UnsupportedImage(path.display().to_string())),
    };
    let bytes = fs::read(path)?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{FakeBackend, TOKEN, user};

    fn filled_login() -> LoginState {
        let mut login = LoginState::new("ann@example.com");
        login.form.form_mut().set_field("password", "secret");
        login
    }

    #[tokio::test]
    async fn sign_in_returns_token() {
        let api = FakeBackend::new();
        let mut login = filled_login();

        assert_eq!(login.sign_in(&api).await.as_deref(), Some(TOKEN));
        assert_eq!(api.calls(), vec!["signin ann@example.com"]);
        assert_eq!(login.form.form().value("password"), "");
        assert!(!login.form.form().is_submitting());
    }

    #[tokio::test]
    async fn rejected_sign_in_keeps_input_and_shows_reason() {
        let api = FakeBackend::new();
        api.reject_writes("non_field_errors: Unable to log in with provided credentials.");
        let mut login = filled_login();

        assert_eq!(login.sign_in(&api).await, None);
        assert_eq!(login.form.form().value("email"), "ann@example.com");
        assert_eq!(login.form.form().value("password"), "secret");
        assert_eq!(
            login.form.message(),
            Some("non_field_errors: Unable to log in with provided credentials.")
        );
    }

    #[tokio::test]
    async fn invalid_login_is_not_sent() {
        let api = FakeBackend::new();
        let mut login = LoginState::new("not-an-email");

        assert_eq!(login.sign_in(&api).await, None);
        assert!(api.calls().is_empty());
        assert_eq!(login.form.form().error("email"), Some("invalid email"));
    }

    #[tokio::test]
    async fn sign_up_failure_keeps_values() {
        let api = FakeBackend::new();
        api.reject_writes("email: user with this email already exists.");
        let mut signup = SignUpState::default();
        for (field, value) in [
            ("first_name", "Ann"),
            ("last_name", "Lee"),
            ("email", "ann@example.com"),
            ("username", "ann"),
            ("password", "long-enough"),
        ] {
            signup.form.form_mut().set_field(field, value);
        }

        assert!(!signup.sign_up(&api).await);
        assert_eq!(signup.form.form().value("username"), "ann");
        assert_eq!(
            signup.form.message(),
            Some("email: user with this email already exists.")
        );

        api.fail_writes.set(false);
        assert!(signup.sign_up(&api).await);
        assert_eq!(signup.form.form().value("username"), "");
        assert_eq!(signup.form.message(), None);
    }

    #[tokio::test]
    async fn reset_password_needs_a_valid_email() {
        let api = FakeBackend::new();
        let mut login = LoginState::new("");
        login.reset_password(&api).await;
        assert_eq!(login.form.message(), Some("email: required"));
        assert!(api.calls().is_empty());

        let mut login = LoginState::new("ann@example.com");
        login.reset_password(&api).await;
        assert_eq!(login.form.message(), Some("check your inbox for a reset link"));
        assert_eq!(api.calls(), vec!["reset password ann@example.com"]);
    }

    #[tokio::test]
    async fn changed_password_closes_panel() {
        let api = FakeBackend::new().with_user(user(None));
        let mut account = AccountState::default();
        account.start_editing(AccountPanel::Password);
        let form = account.password.form_mut();
        form.set_field("current_password", "old-secret");
        form.set_field("new_password", "new-secret");
        form.set_field("repeat_password", "new-secret");

        assert!(account.change_password(&api).await);
        assert_eq!(account.editing, None);
        assert_eq!(account.password.message(), Some("password changed"));
        assert_eq!(account.password.form().value("new_password"), "");
    }

    #[tokio::test]
    async fn deleting_avatar_clears_it() {
        let api = FakeBackend::new().with_user(user(Some("/media/avatars/ann.png")));
        let mut account = AccountState::default();
        account.load(&api).await;
        assert_eq!(
            account.user().and_then(|user| user.avatar.as_deref()),
            Some("/media/avatars/ann.png")
        );

        assert!(account.delete_avatar(&api).await);
        assert_eq!(account.user().and_then(|user| user.avatar.as_deref()), None);
        assert_eq!(account.avatar.message(), Some("avatar removed"));
        assert_eq!(api.user().and_then(|user| user.avatar), None);
    }

    #[tokio::test]
    async fn uploaded_avatar_replaces_the_shown_one() {
        let path = std::env::temp_dir().join(format!("moneyflow-upload-{}.png", std::process::id()));
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
        let api = FakeBackend::new().with_user(user(None));
        let mut account = AccountState::default();
        account.load(&api).await;
        account.start_editing(AccountPanel::Avatar);
        account
            .avatar
            .form_mut()
            .set_field("path", path.display().to_string());

        let uploaded = account.upload_avatar(&api).await;
        fs::remove_file(&path).unwrap();

        assert!(uploaded);
        assert!(account.user().and_then(|user| user.avatar.as_deref()).is_some());
        assert_eq!(account.editing, None);
        assert_eq!(account.avatar.form().value("path"), "");
    }

    #[tokio::test]
    async fn profile_failure_is_reported() {
        let api = FakeBackend::new();
        let mut account = AccountState::default();
        account.load(&api).await;
        assert_eq!(account.user(), None);
        assert_eq!(account.error(), Some("session expired, log in again"));
    }

    #[test]
    fn login_keeps_configured_email_after_reset() {
        let mut login = LoginState::new("ann@example.com");
        login.form.focus_next();
        login.form.push_char('x');
        login.form.form_mut().reset();
        assert_eq!(login.form.form().value("email"), "ann@example.com");
        assert_eq!(login.form.form().value("password"), "");
    }

    #[test]
    fn signup_rules_come_from_fields() {
        let mut signup = SignUpState::default();
        signup.form.form_mut().set_field("email", "not-an-email");
        signup.form.form_mut().set_field("password", "short");
        let errors = signup.form.form().validate();
        assert_eq!(errors.get("email").map(String::as_str), Some("invalid email"));
        assert_eq!(
            errors.get("password").map(String::as_str),
            Some("at least 8 characters")
        );
        assert_eq!(errors.get("first_name").map(String::as_str), Some("required"));
    }

    #[test]
    fn password_change_requires_matching_repeat() {
        let mut account = AccountState::default();
        let form = account.password.form_mut();
        form.set_field("current_password", "old-secret");
        form.set_field("new_password", "new-secret");
        form.set_field("repeat_password", "new-secrt");
        let errors = account.password.form().validate();
        assert_eq!(
            errors.get("repeat_password").map(String::as_str),
            Some("passwords do not match")
        );
    }

    #[test]
    fn focus_wraps_and_touches() {
        let mut login = LoginState::new("");
        login.form.focus_next();
        assert_eq!(login.form.focused().name, "password");
        assert_eq!(login.form.form().error("email"), Some("required"));
        login.form.focus_next();
        assert_eq!(login.form.focus(), 0);
    }

    #[test]
    fn avatar_is_encoded_as_data_uri() {
        let path = std::env::temp_dir().join(format!("moneyflow-avatar-{}.PNG", std::process::id()));
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
        let uri = avatar_data_uri(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn unknown_image_type_is_rejected() {
        let err = avatar_data_uri(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedImage(_)));
    }
}
