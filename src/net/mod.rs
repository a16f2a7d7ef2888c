pub mod http;
pub mod image;
