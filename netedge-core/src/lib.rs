//! Netedge Core
//!
//! Provider-agnostic building blocks for reconciling declarative resources
//! against a remote provisioning API.
//!
//! ## Module Structure
//!
//! - `resource` - Resources, their attribute values and observed state
//! - `provider` - Provider trait and error type
//! - `differ` - Change detection between prior and desired snapshots
//! - `waiter` - Bounded polling until a remote status settles

pub mod differ;
pub mod provider;
pub mod resource;
pub mod waiter;
