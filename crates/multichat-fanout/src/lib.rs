//! Concurrent multi-provider chat dispatch
//!
//! This crate sends one chat turn to several providers at once and collects a
//! uniform result per provider:
//!
//! - [`Dispatcher`] fans a request out and joins every call
//! - [`ProviderResult`] / [`DispatchResults`] hold per-provider outcomes
//! - [`ProviderSlot`] resolves configured providers into handles
//! - [`Conversation`] and [`PrimaryPolicy`] carry a chat forward between rounds

pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod policy;
pub mod registry;
pub mod result;

pub use conversation::Conversation;
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, Result, UnavailableProvider};
pub use policy::PrimaryPolicy;
pub use registry::{ProviderSlot, build_provider};
pub use result::{DispatchResults, ProviderResult, Status, UNAVAILABLE_TEXT};
