pub mod gui;
pub mod report;
