pub use self::config::{APP_NAME, APP_VERSION, Config, DEFAULT_HOST, DEFAULT_PORT, Logs, ResourceConfig};
pub use self::errors::ConfigError;

mod config;
mod errors;
