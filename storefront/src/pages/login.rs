//! Login form.

use crate::environment::StorefrontEnvironment;
use crate::forms::{Field, FormErrors, LoginForm};
use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};
use casaroja_client::types::User;
use casaroja_client::ApiError;
use casaroja_core::effect::Effect;
use casaroja_core::reducer::Reducer;
use casaroja_core::{async_effect, smallvec, SmallVec};
use casaroja_session::Route;
use std::marker::PhantomData;

const LOGIN_FAILED: &str = "Could not sign in. Check your credentials.";

/// Login page state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginState {
    /// Field values
    pub form: LoginForm,
    /// Validation and submission errors
    pub errors: FormErrors,
    /// A submission is in flight
    pub submitting: bool,
    /// Navigation requested by the page
    pub redirect: Option<Route>,
}

/// Login page actions.
#[derive(Debug, Clone)]
pub enum LoginAction {
    /// A field was edited
    Edit {
        /// Field
        field: Field,
        /// New value
        value: String,
    },
    /// Submit the form
    Submit,
    /// The backend accepted the credentials
    Succeeded {
        /// The signed-in user
        user: User,
    },
    /// The backend rejected the submission
    Failed {
        /// Why
        error: ApiError,
    },
    /// The redirect was followed
    RedirectHandled,
}

/// Login page reducer.
#[derive(Debug, Clone)]
pub struct LoginReducer<E, T, A, S> {
    _phantom: PhantomData<(E, T, A, S)>,
}

impl<E, T, A, S> LoginReducer<E, T, A, S> {
    /// Create a reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E, T, A, S> Default for LoginReducer<E, T, A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, T, A, S> Reducer for LoginReducer<E, T, A, S>
where
    E: Catalog + Clone + 'static,
    T: TicketDesk + Clone + 'static,
    A: Accounts + Clone + 'static,
    S: SessionHandle + Clone + 'static,
{
    type State = LoginState;
    type Action = LoginAction;
    type Environment = StorefrontEnvironment<E, T, A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            LoginAction::Edit { field, value } => {
                state.form.edit(field, value);
                state.errors.clear(field);
                smallvec![Effect::None]
            },

            LoginAction::Submit => {
                if state.submitting {
                    return smallvec![Effect::None];
                }
                let credentials = match state.form.validate() {
                    Ok(credentials) => credentials,
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
                    session.set_loading(true).await;
                    match accounts.login(credentials).await {
                        Ok(response) => {
                            session.login(response.user.clone()).await;
                            Some(LoginAction::Succeeded { user: response.user })
                        },
                        Err(error) => {
                            session.set_loading(false).await;
                            Some(LoginAction::Failed { error })
                        },
                    }
                }]
            },

            LoginAction::Succeeded { user } => {
                tracing::info!(user_id = user.id, "Signed in");
                state.submitting = false;
                state.form.password.clear();
                state.redirect = Some(Route::Home);
                smallvec![Effect::None]
            },

            LoginAction::Failed { error } => {
                tracing::warn!(%error, status = error.status, "Sign-in rejected");
                state.submitting = false;
                state.errors = FormErrors::new();
                state.errors.set_general(if error.message.is_empty() {
                    LOGIN_FAILED
                } else {
                    error.message.as_str()
                });
                smallvec![Effect::None]
            },

            LoginAction::RedirectHandled => {
                state.redirect = None;
                smallvec![Effect::None]
            },
        }
    }
}
