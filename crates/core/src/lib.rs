pub mod errors;
pub mod models;
pub mod record;

pub use errors::*;
pub use models::*;
pub use record::*;
