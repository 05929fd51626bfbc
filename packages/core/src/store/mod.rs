//! In-memory hierarchy store
//!
//! - [`HierarchyStore`] - the label/value tree plus its change listeners
//! - [`ListenerRegistry`] / [`Subscription`] - synchronous change notification

mod apply;
mod hierarchy;
mod listeners;

pub use hierarchy::HierarchyStore;
pub use listeners::{ListenerRegistry, Subscription};
