pub mod postgres;
pub mod traits;
