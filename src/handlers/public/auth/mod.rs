// handlers/public/auth/mod.rs - Account and token endpoints

pub mod login;
pub mod password;
pub mod register;

pub use login::login_post;
pub use password::{forgot_password_post, reset_password_post};
pub use register::register_post;

/// Trimmed, lowercased email; `None` when blank
pub(crate) fn normalize_email(raw: Option<&str>) -> Option<String> {
    raw.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty())
}
