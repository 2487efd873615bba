pub mod config;
pub mod logs;
pub mod pipe;
pub mod predict;
pub mod report;
pub mod train;
