pub mod audit;
pub mod collectors;
pub mod export;
pub mod plugin;
pub mod process_control;
pub mod process_details;
pub mod process_table;
pub mod risk;
pub mod snapshot;
