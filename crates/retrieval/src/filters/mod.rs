//! Per-request candidate filters.

pub mod already_seen;
pub mod genre;
pub mod platform;
pub mod runtime;

pub use already_seen::AlreadySeenFilter;
pub use genre::GenreFilter;
pub use platform::PlatformFilter;
pub use runtime::RuntimeFilter;
