use thiserror::Error;

/// Rejected configuration. Raised at construction time only.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config value for `{field}`: {value} (must be {requirement})")]
    InvalidValue { field: &'static str, value: f32, requirement: &'static str },

    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub(crate) fn non_positive(field: &'static str, value: f32) -> Self {
        ConfigError::InvalidValue { field, value, requirement: "> 0" }
    }

    pub(crate) fn negative(field: &'static str, value: f32) -> Self {
        ConfigError::InvalidValue { field, value, requirement: ">= 0" }
    }
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_message_names_the_field() {
        let err = ConfigError::non_positive("sensor_range", -1.0);
        assert_eq!(err.to_string(), "Invalid config value for `sensor_range`: -1 (must be > 0)");
    }

    #[test]
    fn config_error_converts_into_sim_error() {
        let err: SimError = ConfigError::negative("acceleration_rate", -0.5).into();
        assert!(matches!(err, SimError::Config(ConfigError::InvalidValue { .. })));
    }
}
