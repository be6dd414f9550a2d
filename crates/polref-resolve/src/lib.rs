//! Identity resolution on top of any `polref-core` store.
//!
//! Every type here is generic over the store traits, so the same resolver
//! runs against SQLite in production and an in-memory database in tests.
//!
//! | Module       | Purpose |
//! |--------------|---------|
//! | [`riding`]   | District names (with historical misspellings) to districts |
//! | [`identity`] | The staged name → politician resolver |
//! | [`xref`]     | Typed views over the cross-reference store |
//! | [`registry`] | Entity lifecycles: creation side effects and cascades |
//! | [`members`]  | Membership and session lookups |

pub mod identity;
pub mod members;
pub mod registry;
pub mod riding;
pub mod xref;

pub use identity::{IdentityResolver, ResolveContext, ResolveOptions};
pub use members::{Memberships, Sessions};
pub use registry::{PartyRegistry, PoliticianRegistry};
pub use riding::{CorrectionTable, RidingResolver};
pub use xref::{AlternateNames, ExternalIdKind, ExternalIds, PartyAliases};

#[cfg(test)]
mod fixtures;
