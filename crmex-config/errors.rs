/// Possible errors from configuration file processing.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Cannot read configuration file.
    #[error("cannot read configuration file")]
    IoError(#[from] std::io::Error),

    /// Cannot deserialize configuration.
    #[error("cannot deserialize configuration")]
    SerializationError(#[from] serde_yaml::Error),

    /// Configured resource is missing its kind or version.
    #[error("resource '{0}' must have both kind and version")]
    IncompleteResource(String),
}
