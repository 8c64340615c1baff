pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use config::Config;
pub use error::AppError;
pub use startup::{build_router, AppState, Application};
