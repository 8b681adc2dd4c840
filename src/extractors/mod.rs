//! Request extractors: content negotiation and endpoint resolution.

pub mod negotiation;
pub mod target;

pub use negotiation::{negotiate_format, requested_version};
pub use target::Target;
