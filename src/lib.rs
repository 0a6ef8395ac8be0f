//! Client core for the file-sharing portal and the weather dashboard.

pub mod controllers;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;
