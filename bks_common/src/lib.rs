//! Types and helpers shared by every crate in the bookstore payment workspace.
//!
//! * [`Vnd`] is the integer currency amount used throughout checkout and reconciliation.
//! * [`Secret`] keeps API keys and checksum keys out of log output.
//! * [`identity`] turns a bearer token into a normalised [`Identity`](identity::Identity) for attribution.
pub mod helpers;
pub mod identity;
mod secret;
mod vnd;

pub use identity::{read_token, Identity, IdentityError};
pub use secret::Secret;
pub use vnd::{Vnd, VndConversionError};
