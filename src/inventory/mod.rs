pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use error::InventoryError;
pub use repository::InventoryRepository;
pub use service::InventoryService;
