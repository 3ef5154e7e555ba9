use anyhow::Context as _;
use clap::Parser;
use config::ConfigError;

use crate::logging::Mode;

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// An `EnvFilter` directive such as `info` or `portal_api=debug,info`
	pub level: String,
	pub mode: Mode,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_owned(),
			mode: Mode::default(),
		}
	}
}

/// What [`bootstrap`](crate::bootstrap) needs from a binary's config.
pub trait Config: Sized {
	/// Reads the config from the command line, files and environment.
	fn parse() -> anyhow::Result<Self>;

	fn logging(&self) -> &LoggingConfig;

	fn name(&self) -> &str;

	/// Runs after parsing, before anything is started. Returning an error
	/// aborts startup.
	fn pre_hook(&mut self) -> anyhow::Result<()> {
		Ok(())
	}
}

#[derive(Debug, Parser)]
struct Cli {
	/// Path to the config file, toml, yaml and json are accepted
	#[arg(long, short)]
	config: Option<String>,
}

/// The settings every binary shares plus the binary specific `extra`
/// section, which is read from the top level of the same sources.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig<T> {
	pub name: String,
	pub config_file: Option<String>,
	pub logging: LoggingConfig,
	pub extra: T,
}

pub trait ConfigExtention: serde::de::DeserializeOwned + Default {
	const APP_NAME: &'static str;

	/// Environment variables are read as `{ENV_PREFIX}_SECTION__KEY`.
	const ENV_PREFIX: &'static str;

	/// Keys that hold comma separated lists when set from the environment.
	const LIST_KEYS: &'static [&'static str] = &[];

	fn pre_hook(_config: &mut AppConfig<Self>) -> anyhow::Result<()> {
		Ok(())
	}
}

impl<T: ConfigExtention> Default for AppConfig<T> {
	fn default() -> Self {
		Self {
			name: T::APP_NAME.to_owned(),
			config_file: None,
			logging: LoggingConfig::default(),
			extra: T::default(),
		}
	}
}

fn optional<V>(result: Result<V, ConfigError>) -> Result<Option<V>, ConfigError> {
	match result {
		Ok(value) => Ok(Some(value)),
		Err(ConfigError::NotFound(_)) => Ok(None),
		Err(err) => Err(err),
	}
}

impl<T: ConfigExtention> AppConfig<T> {
	/// Loads the config from `config_file` with the environment layered on
	/// top. A missing file is only an error when `required` is set.
	///
	/// `env` replaces the process environment when given.
	pub fn load(
		config_file: Option<&str>,
		required: bool,
		env: Option<config::Map<String, String>>,
	) -> anyhow::Result<Self> {
		let mut builder = config::Config::builder();

		if let Some(path) = config_file {
			builder = builder.add_source(config::File::with_name(path).required(required));
		}

		let mut environment = config::Environment::with_prefix(T::ENV_PREFIX)
			.prefix_separator("_")
			.separator("__")
			.try_parsing(true)
			.source(env);

		if !T::LIST_KEYS.is_empty() {
			environment = environment.list_separator(",");
			for key in T::LIST_KEYS {
				environment = environment.with_list_parse_key(key);
			}
		}

		let source = builder.add_source(environment).build().context("failed to read config")?;

		Ok(Self {
			name: optional(source.get_string("name"))?.unwrap_or_else(|| T::APP_NAME.to_owned()),
			config_file: config_file.map(str::to_owned),
			logging: optional(source.get("logging"))
				.context("invalid logging config")?
				.unwrap_or_default(),
			extra: source.try_deserialize().context("invalid config")?,
		})
	}
}

impl<T: ConfigExtention> Config for AppConfig<T> {
	fn parse() -> anyhow::Result<Self> {
		let cli = Cli::parse();

		match cli.config {
			Some(path) => Self::load(Some(&path), true, None),
			None => Self::load(Some("config"), false, None),
		}
	}

	fn logging(&self) -> &LoggingConfig {
		&self.logging
	}

	fn name(&self) -> &str {
		&self.name
	}

	fn pre_hook(&mut self) -> anyhow::Result<()> {
		T::pre_hook(self)
	}
}
