pub mod asset_class;
pub mod dashboard;
pub mod holding;
pub mod movement;
pub mod projection;
pub mod rebalance;
pub mod settings;
