//! Ticket purchase for one event.

use crate::environment::StorefrontEnvironment;
use crate::forms::{Field, FormErrors, PurchaseForm};
use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};
use casaroja_client::types::Ticket;
use casaroja_client::{ApiError, ApiErrorKind};
use casaroja_core::effect::Effect;
use casaroja_core::reducer::Reducer;
use casaroja_core::{async_effect, smallvec, SmallVec};
use casaroja_session::Route;
use std::marker::PhantomData;

const PURCHASE_FAILED: &str = "The purchase could not be completed.";

/// Purchase page state.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseState {
    /// Field values
    pub form: PurchaseForm,
    /// Validation and submission errors
    pub errors: FormErrors,
    /// A submission is in flight
    pub submitting: bool,
    /// The ticket bought
    pub ticket: Option<Ticket>,
    /// Navigation requested by the page
    pub redirect: Option<Route>,
}

impl PurchaseState {
    /// A fresh purchase of `event`.
    #[must_use]
    pub const fn new(event: u64) -> Self {
        Self {
            form: PurchaseForm::new(event),
            errors: FormErrors::new(),
            submitting: false,
            ticket: None,
            redirect: None,
        }
    }
}

/// Purchase page actions.
#[derive(Debug, Clone)]
pub enum PurchaseAction {
    /// Number of attendees changed
    SetParticipants {
        /// Attendees
        count: u32,
    },
    /// Attendee names changed
    SetParticipantNames {
        /// Names
        names: Vec<String>,
    },
    /// Notes for the organizer changed
    SetSpecialRequests {
        /// Notes
        text: String,
    },
    /// Discount code changed
    SetDiscountCode {
        /// Code
        code: String,
    },
    /// Submit the purchase
    Submit {
        /// Whether a session is held
        authenticated: bool,
    },
    /// The backend issued the ticket
    Purchased {
        /// The ticket
        ticket: Ticket,
    },
    /// The backend rejected the purchase
    Failed {
        /// Why
        error: ApiError,
    },
    /// The redirect was followed
    RedirectHandled,
}

/// Purchase page reducer.
#[derive(Debug, Clone)]
pub struct PurchaseReducer<E, T, A, S> {
    _phantom: PhantomData<(E, T, A, S)>,
}

impl<E, T, A, S> PurchaseReducer<E, T, A, S> {
    /// Create a reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E, T, A, S> Default for PurchaseReducer<E, T, A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, T, A, S> Reducer for PurchaseReducer<E, T, A, S>
where
    E: Catalog + Clone + 'static,
    T: TicketDesk + Clone + 'static,
    A: Accounts + Clone + 'static,
    S: SessionHandle + Clone + 'static,
{
    type State = PurchaseState;
    type Action = PurchaseAction;
    type Environment = StorefrontEnvironment<E, T, A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            PurchaseAction::SetParticipants { count } => {
                state.form.participants_count = count;
                state.errors.clear(Field::ParticipantsCount);
                smallvec![Effect::None]
            },

            PurchaseAction::SetParticipantNames { names } => {
                state.form.participant_names = names;
                state.errors.clear(Field::ParticipantNames);
                smallvec![Effect::None]
            },

            PurchaseAction::SetSpecialRequests { text } => {
                state.form.special_requests = text;
                smallvec![Effect::None]
            },

            PurchaseAction::SetDiscountCode { code } => {
                state.form.discount_code = code;
                smallvec![Effect::None]
            },

            PurchaseAction::Submit { authenticated } => {
                if !authenticated {
                    state.redirect = Some(Route::Login);
                    return smallvec![Effect::None];
                }
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
                let desk = env.tickets.clone();
                smallvec![async_effect! {
                    match desk.purchase(request).await {
                        Ok(ticket) => Some(PurchaseAction::Purchased { ticket }),
                        Err(error) => Some(PurchaseAction::Failed { error }),
                    }
                }]
            },

            PurchaseAction::Purchased { ticket } => {
                tracing::info!(
                    ticket_number = %ticket.ticket_number,
                    event_id = state.form.event,
                    "Tickets purchased"
                );
                state.submitting = false;
                state.ticket = Some(ticket);
                state.redirect = Some(Route::Tickets);
                smallvec![Effect::None]
            },

            PurchaseAction::Failed { error } => {
                tracing::warn!(%error, event_id = state.form.event, "Purchase rejected");
                state.submitting = false;
                if error.kind() == ApiErrorKind::Unauthorized {
                    state.redirect = Some(Route::Login);
                }
                state.errors = FormErrors::from_api_error(&error, PURCHASE_FAILED);
                smallvec![Effect::None]
            },

            PurchaseAction::RedirectHandled => {
                state.redirect = None;
                smallvec![Effect::None]
            },
        }
    }
}
