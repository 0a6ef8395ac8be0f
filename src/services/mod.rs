pub mod api;
pub mod cookies;
pub mod scheduler;
pub mod session;
