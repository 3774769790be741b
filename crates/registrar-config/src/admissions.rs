use crate::{env_parse, env_string};

/// Admissions defaults.
#[derive(Clone, Debug)]
pub struct AdmissionsConfig {
    /// First segment of every application number.
    pub application_number_prefix: String,
    /// Where screenings take place; returned with every reservation.
    pub screening_location: String,
    /// Capacity used when a new screening slot does not specify one.
    pub default_slot_capacity: i32,
}

impl AdmissionsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            application_number_prefix: env_string(
                "APPLICATION_NUMBER_PREFIX",
                &defaults.application_number_prefix,
            ),
            screening_location: env_string("SCREENING_LOCATION", &defaults.screening_location),
            default_slot_capacity: env_parse(
                "DEFAULT_SLOT_CAPACITY",
                defaults.default_slot_capacity,
            ),
        }
    }
}

impl Default for AdmissionsConfig {
    fn default() -> Self {
        Self {
            application_number_prefix: "JICO".to_string(),
            screening_location: "Jicohsat auditorium, Jicohsat School, Tudun Wada".to_string(),
            default_slot_capacity: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdmissionsConfig::default();
        assert_eq!(config.application_number_prefix, "JICO");
        assert_eq!(config.default_slot_capacity, 50);
        assert!(config.screening_location.starts_with("Jicohsat auditorium"));
    }
}
