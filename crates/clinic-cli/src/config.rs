use clinic_core::models::ScheduleConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    pub schedule: ScheduleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "clinic.db".to_string(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then `clinic.toml`, then `CLINIC_*` environment variables.
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("clinic.toml"))
            .merge(Env::prefixed("CLINIC_").split("__"))
    }
}
