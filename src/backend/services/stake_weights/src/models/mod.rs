pub mod aggregate;
pub mod stake;
pub mod weights;
