pub mod error;
pub mod middleware;
pub mod models;

pub use error::*;
pub use middleware::*;
pub use models::*;
