pub mod aggregator;
pub mod allocation;
pub mod blender;
pub mod formatter;
pub mod stake_sync;
