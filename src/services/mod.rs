pub mod coordinator;
pub mod database;
pub mod inventory;
pub mod payment;
pub mod sequence;

pub use coordinator::InvoiceCoordinator;
pub use database::Database;
