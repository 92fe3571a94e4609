//! # Casa Roja storefront
//!
//! Customer-facing pages for the Casa Roja cultural-events backend: browse
//! events and venues, sign in or register, buy tickets and redeem them.
//!
//! Every page is a [`Reducer`](casaroja_core::reducer::Reducer) hosted in a
//! [`Store`](casaroja_runtime::Store). Pages talk to the backend through the
//! capability traits in [`providers`], so the same reducers run against the
//! live query layer or against the in-memory mocks used by the tests.
//!
//! ## Example
//!
//! ```no_run
//! use casaroja_storefront::pages::{HomeAction, HomeReducer, HomeState};
//! use casaroja_storefront::{render, Storefront, StorefrontConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let storefront = Storefront::open(&StorefrontConfig::from_env()?)?;
//! storefront.initialize().await?;
//!
//! let home = storefront
//!     .run_page(HomeState::default(), HomeReducer::new(), [HomeAction::Load])
//!     .await?;
//! println!("{}", render::home(&home));
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod environment;
pub mod forms;
pub mod pages;
pub mod providers;
pub mod render;

#[cfg(test)]
mod mocks;

pub use app::{LiveEnvironment, PageStore, Storefront, StorefrontError};
pub use config::{ConfigError, StorefrontConfig};
pub use environment::StorefrontEnvironment;
pub use forms::{Field, FormErrors, LoginForm, PurchaseForm, RegisterForm};
pub use pages::{Loadable, RequestId, RequestTracker};
pub use providers::{Accounts, Catalog, SessionHandle, TicketDesk};
