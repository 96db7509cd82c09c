//! Filter state.
//!
//! - [`VisibilityStore`]: identifier -> hidden channel set, write-through
//! - [`IdentityResolver`]: session -> identifier bindings

mod identity;
mod visibility;

pub use identity::IdentityResolver;
pub use visibility::{HiddenSet, VisibilityStore};
