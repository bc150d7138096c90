pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod status_machine;
pub mod totals;

pub use error::OrderError;
pub use models::{CustomerType, Order, OrderItem, OrderStatus, OrderType};
pub use service::OrderService;
pub use status_machine::StatusMachine;
pub use totals::TotalsCalculator;
