//! rusty-forms validation predicates
//!
//! Pure checks used by the rule engine in `rusty-forms`. Every check returns
//! `Result<(), Violation>`; the `Display` of a [`Violation`] is the message
//! shown to users, so callers can either render it directly or match on the
//! variant to build their own wording.

pub mod collection;
pub mod email;
pub mod numeric;
pub mod password;
pub mod string;
pub mod violation;

pub use collection::*;
pub use email::*;
pub use numeric::*;
pub use password::*;
pub use string::*;
pub use violation::Violation;
