//! looker-bindings: additive, non-authoritative role and group bindings for Looker.
//!
//! A binding grants a set of associations (groups on a role, roles on a user,
//! roles on a group) without claiming the parent's whole association set.
//! Writes keep every association the binding did not declare; reads report
//! only the declared associations the parent actually holds.

pub mod association;
pub mod client;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod resources;
pub mod slice;
pub mod store;

pub use association::AssociationSet;
pub use client::LookerClient;
pub use config::{BindingsConfig, ClientSettings, LookerConfig};
pub use error::{BindingError, Result, WriteErrors};
pub use reconciler::{Change, ReadOutcome, Reconciler, WritePlan};
pub use resources::{
    BindingConfig, BindingKind, BindingResource, BindingState, LookerStore, format_binding_id,
    parse_binding_id,
};
pub use store::AssociationStore;
pub use store::memory::MemoryStore;
