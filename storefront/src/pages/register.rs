//! Registration form.
//!
//! A successful registration is followed by a login with the same
//! credentials so the client holds tokens. If that login fails the session
//! stays anonymous and the page sends the new user to the login form.

use crate::environment::StorefrontEnvironment;
use crate::forms::{Field, FormErrors, RegisterForm};
use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};
use casaroja_client::types::{LoginRequest, User};
use casaroja_client::ApiError;
use casaroja_core::effect::Effect;
use casaroja_core::reducer::Reducer;
use casaroja_core::{async_effect, smallvec, SmallVec};
use casaroja_session::Route;
use std::marker::PhantomData;

const REGISTER_FAILED: &str = "Could not create the account. Please try again.";

/// Registration page state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterState {
    /// Field values
    pub form: RegisterForm,
    /// Validation and submission errors
    pub errors: FormErrors,
    /// A submission is in flight
    pub submitting: bool,
    /// Name of the new account, for the welcome message
    pub welcome: Option<String>,
    /// Navigation requested by the page
    pub redirect: Option<Route>,
}

/// Registration page actions.
#[derive(Debug, Clone)]
pub enum RegisterAction {
    /// A field was edited
    Edit {
        /// Field
        field: Field,
        /// New value
        value: String,
    },
    /// Submit the form
    Submit,
    /// The account was created
    Succeeded {
        /// The new user
        user: User,
        /// The automatic login went through
        signed_in: bool,
    },
    /// The backend rejected the submission
    Failed {
        /// Why
        error: ApiError,
    },
    /// The redirect was followed
    RedirectHandled,
}

/// Registration page reducer.
#[derive(Debug, Clone)]
pub struct RegisterReducer<E, T, A, S> {
    _phantom: PhantomData<(E, T, A, S)>,
}

impl<E, T, A, S> RegisterReducer<E, T, A, S> {
    /// Create a reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E, T, A, S> Default for RegisterReducer<E, T, A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, T, A, S> Reducer for RegisterReducer<E, T, A, S>
where
    E: Catalog + Clone + 'static,
    T: TicketDesk + Clone + 'static,
    A: Accounts + Clone + 'static,
    S: SessionHandle + Clone + 'static,
{
    type State = RegisterState;
    type Action = RegisterAction;
    type Environment = StorefrontEnvironment<E, T, A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            RegisterAction::Edit { field, value } => {
                state.form.edit(field, value);
                state.errors.clear(field);
                smallvec![Effect::None]
            },

            RegisterAction::Submit => {
                if state.submitting {
                    return smallvec![Effect::None];
                }
                let request = match state.form.validate() {
                    Ok(request) => request,
                    Err(errors) => {
                        state.errors = errors;
                        return smallvec![Effect::None];
                    },
                };

                state.errors = FormErrors::new();
                state.submitting = true;
                let accounts = env.accounts.clone();
                let session = env.session.clone();
                smallvec![async_effect! {
                    let credentials = LoginRequest {
                        username: request.username.clone(),
                        password: request.password.clone(),
                    };
                    session.set_loading(true).await;
                    let user = match accounts.register(request).await {
                        Ok(user) => user,
                        Err(error) => {
                            session.set_loading(false).await;
                            return Some(RegisterAction::Failed { error });
                        },
                    };
                    if let Err(error) = accounts.login(credentials).await {
                        tracing::warn!(%error, user_id = user.id, "Registered but automatic login failed");
                        session.set_loading(false).await;
                        return Some(RegisterAction::Succeeded { user, signed_in: false });
                    }
                    session.login(user.clone()).await;
                    Some(RegisterAction::Succeeded { user, signed_in: true })
                }]
            },

            RegisterAction::Succeeded { user, signed_in } => {
                tracing::info!(user_id = user.id, signed_in, "Account created");
                state.submitting = false;
                state.form.password.clear();
                state.form.confirm_password.clear();
                state.welcome = Some(if user.first_name.is_empty() {
                    user.username
                } else {
                    user.first_name
                });
                state.redirect = Some(if signed_in { Route::Home } else { Route::Login });
                smallvec![Effect::None]
            },

            RegisterAction::Failed { error } => {
                tracing::warn!(%error, status = error.status, "Registration rejected");
                state.submitting = false;
                state.errors = FormErrors::from_api_error(&error, REGISTER_FAILED);
                smallvec![Effect::None]
            },

            RegisterAction::RedirectHandled => {
                state.redirect = None;
                smallvec![Effect::None]
            },
        }
    }
}
