pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod status_machine;

pub use error::PaymentError;
pub use gateway::{GatewayConfig, PaymentGateway};
pub use models::{Payment, PaymentMethod, PaymentProvider, PaymentStatus};
pub use repository::PaymentsRepository;
pub use service::PaymentService;
pub use status_machine::PaymentStatusMachine;
