//! Checkout state machine.
//!
//! One purchase attempt is a tagged state value:
//!
//! ```text
//! Address -> Summary -> Submitting -> { Succeeded | Failed }
//!              ^  |                        |
//!              |  +--- edit_address        +--- retry -> Summary
//! ```
//!
//! Each variant carries only the data valid for it, so illegal states
//! ("Submitting with no delivery details") are unrepresentable. `Succeeded`
//! is terminal: the surrounding context discards the session once the
//! confirmation is consumed, so a stale checkout can never be reopened.
//!
//! The session is ephemeral - it lives for one checkout attempt inside the
//! shopper context and is never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::services::orders::OrderResult;

/// Field name -> human-readable message, for per-field error display.
pub type FieldErrors = BTreeMap<String, String>;

/// Recipient and address details collected in the Address step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DeliveryDetails {
    #[validate(length(min = 1, message = "recipient name is required"))]
    pub full_name: String,
    #[validate(length(min = 10, message = "a valid phone number is required"))]
    pub phone: String,
    /// Optional for authenticated shoppers; required on the guest path
    /// (checked in [`DeliveryDetails::validate_for`]).
    #[validate(email(message = "a valid email address is required"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "address line 1 is required"))]
    pub address_line1: String,
    pub address_line2: Option<String>,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(equal = 6, message = "a 6-digit pincode is required"))]
    pub postal_code: String,
    pub notes: Option<String>,
}

impl DeliveryDetails {
    /// Validate for the given purchase path. Guests must supply an email;
    /// for authenticated shoppers it is optional (identity is resolved
    /// server-side).
    ///
    /// # Errors
    ///
    /// Returns the full field-keyed error map so the form can show every
    /// problem at once.
    pub fn validate_for(&self, guest: bool) -> Result<(), FieldErrors> {
        let mut fields = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(errors) => flatten_errors(&errors),
        };

        if guest && self.email.as_deref().is_none_or(|email| email.trim().is_empty()) {
            fields
                .entry("email".to_string())
                .or_insert_with(|| "email is required for guest checkout".to_string());
        }

        if fields.is_empty() { Ok(()) } else { Err(fields) }
    }
}

/// Keep the first message per field; the form shows one error per input.
fn flatten_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .iter()
        .filter_map(|(field, errors)| {
            let first = errors.first()?;
            let message = first
                .message
                .as_ref()
                .map_or_else(|| first.code.to_string(), ToString::to_string);
            Some(((*field).to_string(), message))
        })
        .collect()
}

/// Errors from checkout transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Checkout is only reachable with a non-empty cart.
    #[error("checkout requires a non-empty cart")]
    EmptyCart,

    /// Delivery details failed validation; the state stays at Address.
    #[error("invalid delivery details")]
    InvalidDetails(FieldErrors),

    /// A submission for this session is already outstanding; no second
    /// network call is issued.
    #[error("an order submission is already in progress")]
    SubmissionInFlight,

    /// The requested action is not valid from the current step.
    #[error("cannot {action} from the {state} step")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    /// No checkout session exists for this shopper.
    #[error("no active checkout session")]
    NoSession,
}

/// The step of one checkout attempt, with only the data valid for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CheckoutState {
    /// Collecting delivery details. `details` holds the last (possibly
    /// invalid) entry so the form can be redisplayed.
    Address { details: Option<DeliveryDetails> },
    /// Immutable review of cart and details before submission.
    Summary { details: DeliveryDetails },
    /// An order submission is outstanding. At most one at a time.
    Submitting { details: DeliveryDetails },
    /// Terminal. The confirmed order.
    Succeeded { result: OrderResult },
    /// The submission failed; retry returns to Summary with state intact.
    Failed {
        details: DeliveryDetails,
        message: String,
    },
}

impl CheckoutState {
    /// Step name for errors and logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Address { .. } => "address",
            Self::Summary { .. } => "summary",
            Self::Submitting { .. } => "submitting",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One checkout attempt. Created on entering checkout with a non-empty
/// cart, discarded on success consumption or abandonment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    state: CheckoutState,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSession {
    /// Start a new attempt at the Address step.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CheckoutState::Address { details: None },
        }
    }

    /// The current step.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// The delivery details, if the current step carries them.
    #[must_use]
    pub const fn delivery_details(&self) -> Option<&DeliveryDetails> {
        match &self.state {
            CheckoutState::Address { details } => details.as_ref(),
            CheckoutState::Summary { details }
            | CheckoutState::Submitting { details }
            | CheckoutState::Failed { details, .. } => Some(details),
            CheckoutState::Succeeded { .. } => None,
        }
    }

    /// Submit delivery details from the Address step.
    ///
    /// Valid details transition to Summary. Invalid details keep the state
    /// at Address, retaining the entry for redisplay.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InvalidDetails`] with per-field messages.
    /// - [`CheckoutError::InvalidTransition`] if not at Address.
    pub fn submit_address(
        &mut self,
        details: DeliveryDetails,
        guest: bool,
    ) -> Result<(), CheckoutError> {
        if !matches!(self.state, CheckoutState::Address { .. }) {
            return Err(self.invalid_transition("submit delivery details"));
        }

        match details.validate_for(guest) {
            Ok(()) => {
                self.state = CheckoutState::Summary { details };
                Ok(())
            }
            Err(fields) => {
                self.state = CheckoutState::Address {
                    details: Some(details),
                };
                Err(CheckoutError::InvalidDetails(fields))
            }
        }
    }

    /// Return from Summary to Address, preserving the entered details.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] if not at Summary.
    pub fn edit_address(&mut self) -> Result<(), CheckoutError> {
        match self.take_state() {
            CheckoutState::Summary { details } => {
                self.state = CheckoutState::Address {
                    details: Some(details),
                };
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid_transition("edit the address"))
            }
        }
    }

    /// Transition Summary -> Submitting, returning the details to build the
    /// order request from. The caller performs the network call and then
    /// reports [`Self::submission_succeeded`] or [`Self::submission_failed`].
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::SubmissionInFlight`] if already Submitting; the
    ///   caller must not issue a second network call.
    /// - [`CheckoutError::InvalidTransition`] from any other step.
    pub fn begin_submission(&mut self) -> Result<DeliveryDetails, CheckoutError> {
        match self.take_state() {
            CheckoutState::Summary { details } => {
                self.state = CheckoutState::Submitting {
                    details: details.clone(),
                };
                Ok(details)
            }
            submitting @ CheckoutState::Submitting { .. } => {
                self.state = submitting;
                Err(CheckoutError::SubmissionInFlight)
            }
            other => {
                self.state = other;
                Err(self.invalid_transition("submit the order"))
            }
        }
    }

    /// Record a confirmed order. Submitting -> Succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] if no submission was
    /// outstanding.
    pub fn submission_succeeded(&mut self, result: OrderResult) -> Result<(), CheckoutError> {
        match self.take_state() {
            CheckoutState::Submitting { .. } => {
                self.state = CheckoutState::Succeeded { result };
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid_transition("record a confirmed order"))
            }
        }
    }

    /// Record a failed submission. Submitting -> Failed; cart and details
    /// are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] if no submission was
    /// outstanding.
    pub fn submission_failed(&mut self, message: String) -> Result<(), CheckoutError> {
        match self.take_state() {
            CheckoutState::Submitting { details } => {
                self.state = CheckoutState::Failed { details, message };
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid_transition("record a failed order"))
            }
        }
    }

    /// Return from Failed to Summary. The retry rebuilds the order request
    /// fresh from the then-current cart and details.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] if the last submission
    /// did not fail.
    pub fn retry(&mut self) -> Result<(), CheckoutError> {
        match self.take_state() {
            CheckoutState::Failed { details, .. } => {
                self.state = CheckoutState::Summary { details };
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid_transition("retry the submission"))
            }
        }
    }

    fn take_state(&mut self) -> CheckoutState {
        std::mem::replace(&mut self.state, CheckoutState::Address { details: None })
    }

    fn invalid_transition(&self, action: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }
}
