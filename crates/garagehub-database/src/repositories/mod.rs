//! Concrete repository implementations for auth-core entities.

pub mod login_attempt;
pub mod refresh_token;
pub mod user;

pub use login_attempt::LoginAttemptRepository;
pub use refresh_token::RefreshTokenRepository;
pub use user::UserRepository;
