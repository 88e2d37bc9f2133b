pub mod browser;
pub mod datetime;
pub mod http;
pub mod text;
