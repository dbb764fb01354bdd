pub mod config;
pub mod logging;

pub use config::{
    AresConfig, ConfigError, ConfigValue, DefaultSecretResolver, FromConfigValue, MapResolver,
    SecretResolver,
};
pub use logging::init_tracing;
