//! Shared vocabulary of polref: politicians, ridings, parties, sessions,
//! memberships and the cross-reference keys that point at them.
//!
//! Storage is described by the traits in [`store`]; the SQLite backend and the
//! resolvers live in their own crates and meet here.

// Store traits return `impl Future + Send` explicitly, so the lint's advice
// does not apply.
#![allow(async_fn_in_trait)]

pub mod district;
pub mod error;
pub mod membership;
pub mod normalize;
pub mod party;
pub mod politician;
pub mod session;
pub mod store;
pub mod xref;

pub use error::{Error, Result};
