//! Form state and local validation.
//!
//! Every form validates before anything reaches the network. A failed
//! validation yields [`FormErrors`] keyed by [`Field`]; a successful one
//! yields the request body to submit.

use casaroja_client::types::{LoginRequest, PurchaseTicketRequest, RegisterRequest, UserType};
use casaroja_client::ApiError;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Minimum password length accepted by the storefront.
pub const MIN_PASSWORD_LEN: usize = 6;

#[allow(clippy::expect_used)] // literal patterns
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

#[allow(clippy::expect_used)]
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-\(\)]+$").expect("phone pattern compiles"));

/// An input on one of the storefront forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Email (also the username)
    Email,
    /// Password
    Password,
    /// Password confirmation
    ConfirmPassword,
    /// Given name
    FirstName,
    /// Family name
    LastName,
    /// Optional phone number
    Phone,
    /// Number of attendees on a purchase
    ParticipantsCount,
    /// Attendee names on a purchase
    ParticipantNames,
}

impl Field {
    /// Form field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm_password",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Phone => "phone",
            Self::ParticipantsCount => "participants_count",
            Self::ParticipantNames => "participant_names",
        }
    }

    /// The form field a backend validation key refers to.
    #[must_use]
    pub fn from_backend_key(key: &str) -> Option<Self> {
        match key {
            "email" | "username" => Some(Self::Email),
            "password" => Some(Self::Password),
            "password_confirm" => Some(Self::ConfirmPassword),
            "first_name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            "phone_number" => Some(Self::Phone),
            "participants_count" => Some(Self::ParticipantsCount),
            "participant_names" => Some(Self::ParticipantNames),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validation errors, one message per field plus an optional page-level
/// message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} invalid field(s)", .fields.len())]
pub struct FormErrors {
    fields: BTreeMap<Field, String>,
    /// Page-level message, e.g. rejected credentials
    pub general: Option<String>,
}

impl FormErrors {
    /// No errors.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            general: None,
        }
    }

    /// Record `message` against `field`, replacing any earlier one.
    pub fn set(&mut self, field: Field, message: impl Into<String>) {
        self.fields.insert(field, message.into());
    }

    /// The message for `field`.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Whether `field` has an error.
    #[must_use]
    pub fn has(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    /// Drop the error on `field` only.
    pub fn clear(&mut self, field: Field) {
        self.fields.remove(&field);
    }

    /// Set the page-level message.
    pub fn set_general(&mut self, message: impl Into<String>) {
        self.general = Some(message.into());
    }

    /// Whether there are no field errors and no page-level message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_none()
    }

    /// Field errors in field order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.fields.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Errors for a rejected submission.
    ///
    /// Backend validation bodies (`{"email": ["..."]}`) are mapped onto the
    /// matching fields. Anything else becomes the page-level message, using
    /// `fallback` when the error carries no text of its own.
    #[must_use]
    pub fn from_api_error(error: &ApiError, fallback: &str) -> Self {
        let mut errors = Self::new();
        if let Some(Value::Object(body)) = &error.data {
            for (key, value) in body {
                let Some(field) = Field::from_backend_key(key) else {
                    continue;
                };
                if let Some(message) = first_message(value) {
                    errors.set(field, message);
                }
            }
        }

        if errors.fields.is_empty() {
            let message = if error.message.is_empty() {
                fallback
            } else {
                error.message.as_str()
            };
            errors.set_general(message);
        }
        errors
    }
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(message) => Some(message.clone()),
        Value::Array(messages) => messages.iter().find_map(first_message),
        _ => None,
    }
}

fn check_email(errors: &mut FormErrors, email: &str) {
    if email.is_empty() {
        errors.set(Field::Email, "Email is required");
    } else if !EMAIL.is_match(email) {
        errors.set(Field::Email, "Enter a valid email");
    }
}

fn check_password(errors: &mut FormErrors, password: &str) {
    if password.is_empty() {
        errors.set(Field::Password, "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.set(
            Field::Password,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
}

/// Login form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Email
    pub email: String,
    /// Password
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    /// Set `field` to `value`. Fields the form does not have are ignored.
    pub fn edit(&mut self, field: Field, value: String) {
        match field {
            Field::Email => self.email = value,
            Field::Password => self.password = value,
            _ => {},
        }
    }

    /// Validate and build the login request. The email is the username.
    ///
    /// # Errors
    ///
    /// Returns [`FormErrors`] naming every invalid field.
    pub fn validate(&self) -> Result<LoginRequest, FormErrors> {
        let mut errors = FormErrors::new();
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);

        errors.into_result(LoginRequest {
            username: self.email.clone(),
            password: self.password.clone(),
        })
    }
}

/// Registration form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation
    pub confirm_password: String,
    /// Optional phone number
    pub phone: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .finish_non_exhaustive()
    }
}

impl RegisterForm {
    /// Set `field` to `value`. Fields the form does not have are ignored.
    pub fn edit(&mut self, field: Field, value: String) {
        match field {
            Field::FirstName => self.first_name = value,
            Field::LastName => self.last_name = value,
            Field::Email => self.email = value,
            Field::Password => self.password = value,
            Field::ConfirmPassword => self.confirm_password = value,
            Field::Phone => self.phone = value,
            Field::ParticipantsCount | Field::ParticipantNames => {},
        }
    }

    /// Validate and build the registration request for a `client` account.
    ///
    /// # Errors
    ///
    /// Returns [`FormErrors`] naming every invalid field.
    pub fn validate(&self) -> Result<RegisterRequest, FormErrors> {
        let mut errors = FormErrors::new();

        if self.first_name.trim().is_empty() {
            errors.set(Field::FirstName, "First name is required");
        }
        if self.last_name.trim().is_empty() {
            errors.set(Field::LastName, "Last name is required");
        }
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);

        if self.confirm_password.is_empty() {
            errors.set(Field::ConfirmPassword, "Confirm your password");
        } else if self.password != self.confirm_password {
            errors.set(Field::ConfirmPassword, "Passwords do not match");
        }

        if !self.phone.is_empty() && !PHONE.is_match(&self.phone) {
            errors.set(Field::Phone, "Enter a valid phone number");
        }

        errors.into_result(RegisterRequest {
            username: self.email.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            password_confirm: self.confirm_password.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            user_type: UserType::Client,
            phone_number: self.phone.clone(),
        })
    }
}

/// Ticket purchase form for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseForm {
    /// Event id
    pub event: u64,
    /// Number of attendees
    pub participants_count: u32,
    /// Attendee names, blank entries ignored
    pub participant_names: Vec<String>,
    /// Notes for the organizer
    pub special_requests: String,
    /// Discount code
    pub discount_code: String,
}

impl PurchaseForm {
    /// A form for one attendee of `event`.
    #[must_use]
    pub const fn new(event: u64) -> Self {
        Self {
            event,
            participants_count: 1,
            participant_names: Vec::new(),
            special_requests: String::new(),
            discount_code: String::new(),
        }
    }

    /// Validate and build the purchase request.
    ///
    /// At least one attendee is required, and no more names than
    /// attendees may be given.
    ///
    /// # Errors
    ///
    /// Returns [`FormErrors`] naming every invalid field.
    pub fn validate(&self) -> Result<PurchaseTicketRequest, FormErrors> {
        let mut errors = FormErrors::new();

        if self.participants_count < 1 {
            errors.set(Field::ParticipantsCount, "At least one participant is required");
        }

        let names: Vec<String> = self
            .participant_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        if names.len() > self.participants_count as usize {
            errors.set(
                Field::ParticipantNames,
                format!(
                    "{} names given for {} participant(s)",
                    names.len(),
                    self.participants_count
                ),
            );
        }

        errors.into_result(PurchaseTicketRequest {
            event: self.event,
            participants_count: self.participants_count,
            participant_names: names,
            special_requests: non_empty(&self.special_requests),
            discount_code: non_empty(&self.discount_code),
        })
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}
