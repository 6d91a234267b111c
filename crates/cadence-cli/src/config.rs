use std::path::PathBuf;

use cadence_core::calendar::WeekStart;
use cadence_core::expansion::ExpansionConfig;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::cli::ViewKind;

pub const CONFIG_FILE: &str = "cadence.toml";
pub const ENV_PREFIX: &str = "CADENCE_";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the tasks
    pub store_path: PathBuf,
    pub week_start: WeekStart,
    pub default_view: ViewKind,
    pub expansion: ExpansionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("cadence.json"),
            week_start: WeekStart::default(),
            default_view: ViewKind::Week,
            expansion: ExpansionConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// `cadence.toml` in the working directory, overridden by `CADENCE_*`
    /// variables (`CADENCE_EXPANSION__MARGIN_DAYS` for nested keys).
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
