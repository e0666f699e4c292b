pub mod analytics;
pub mod core;
pub mod export;
pub mod insights;
pub mod roster;
