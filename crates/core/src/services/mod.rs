pub mod ingest_service;
pub mod lot_matcher;
pub mod position_aggregator;
pub mod projection_engine;
pub mod rebalance_analyzer;
pub mod series_service;
