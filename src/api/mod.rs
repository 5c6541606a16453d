pub mod download;
pub mod logging;
