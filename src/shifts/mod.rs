pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use error::ShiftError;
pub use models::{CashShift, Reconciliation, ReconciliationStatus, ShiftStatus};
pub use repository::ShiftsRepository;
pub use service::ShiftService;
