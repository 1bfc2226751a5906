//! SQLite implementations of the warden repository traits.

pub mod lockout;
pub mod password_history;
pub mod user;

pub use lockout::SqliteLockoutRepository;
pub use password_history::SqlitePasswordHistoryRepository;
pub use user::SqliteUserRepository;
