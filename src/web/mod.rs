pub mod admin;
pub mod auth;
pub mod catalog;
pub mod flash;
pub mod router;
pub mod session;
pub mod slug;
pub mod state;
pub mod templates;
pub mod uploads;

pub use state::AppState;
