use std::{
	env, fs,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// Filter translation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
	/// Separator between relation hops in a field path (default: ".")
	pub path_separator: String,
	/// Accept `offset` when `skip` is absent (default: true)
	pub allow_offset_alias: bool,
	/// Collapse duplicate parent rows after a to-many join (default: true)
	pub dedup_to_many: bool,
}

impl Default for FilterConfig {
	fn default() -> Self {
		Self {
			path_separator: ".".to_string(),
			allow_offset_alias: true,
			dedup_to_many: true,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
	pub level: String,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
	pub filter: FilterConfig,
	pub log: LogConfig,
}

impl Config {
	/// Load config from a TOML file, with environment variable overrides.
	/// Falls back to defaults if the file is not found. LBQUERY_CONFIG overrides the path.
	pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
		ConfigLoader::from_env().load(path)
	}
}

struct ConfigLoader {
	config_override: Option<PathBuf>,
	separator_override: Option<String>,
	log_override: Option<String>,
}

impl ConfigLoader {
	fn from_env() -> Self {
		Self {
			config_override: env::var("LBQUERY_CONFIG").ok().map(PathBuf::from),
			separator_override: env::var("LBQUERY_PATH_SEPARATOR").ok(),
			log_override: env::var("LBQUERY_LOG").ok(),
		}
	}

	fn load<P: AsRef<Path>>(&self, default_path: P) -> anyhow::Result<Config> {
		let cfg_path = self
			.config_override
			.clone()
			.unwrap_or_else(|| default_path.as_ref().to_path_buf());

		let mut cfg = match fs::read_to_string(&cfg_path) {
			Ok(s) => toml::from_str(&s)?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
			Err(e) => return Err(e.into()),
		};
		self.apply_overrides(&mut cfg);
		Ok(cfg)
	}

	fn apply_overrides(&self, cfg: &mut Config) {
		if let Some(sep) = &self.separator_override
			&& !sep.is_empty()
		{
			cfg.filter.path_separator = sep.clone();
		}

		if let Some(level) = &self.log_override {
			cfg.log.level = level.clone();
		}
	}
}
