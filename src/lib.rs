pub mod config;
pub mod dashboard;
pub mod feed;
pub mod net;
pub mod render;
pub mod sentiment;
pub mod shell;
