//! Command-line arguments
//!
//! Every flag is optional and overrides the matching field of the loaded
//! (or default) configuration.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use gatecheck_core::config::{CatalogSelection, HarnessConfig, LogFormat};
use gatecheck_core::error::ConfigError;
use gatecheck_core::identifiers::IdSelection;
use std::ffi::OsString;
use std::path::PathBuf;

/// Parsed flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// TOML configuration file
    pub config: Option<PathBuf>,
    /// Target base URL
    pub base_url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Maximum requests in flight
    pub concurrency: Option<usize>,
    /// Run destructive cases for real
    pub unsafe_mode: bool,
    /// Explicit catalog file
    pub catalog: Option<PathBuf>,
    /// Discover endpoints from API descriptions
    pub discover: bool,
    /// Report directory
    pub output_dir: Option<PathBuf>,
    /// Live id selection
    pub id_selection: Option<IdSelection>,
    /// Drop fallback-id failures from triage
    pub exclude_fallback_failures: bool,
    /// Never start a dev server
    pub no_auto_start: bool,
    /// Dev server command
    pub dev_command: Option<String>,
    /// Log level for gatecheck targets
    pub log_level: Option<String>,
    /// Log format
    pub log_format: Option<LogFormat>,
}

/// Build the clap command
#[must_use]
pub fn command() -> Command {
    Command::new("gatecheck")
        .version(gatecheck_core::VERSION)
        .about("Sweep a multi-service API gateway's endpoints and triage the failures")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .short('u')
                .help("Gateway base URL [default: http://localhost:3000]"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_parser(value_parser!(u64))
                .help("Per-request timeout in seconds"),
        )
        .arg(
            Arg::new("concurrency")
                .long("concurrency")
                .short('j')
                .value_parser(value_parser!(usize))
                .help("Maximum requests in flight"),
        )
        .arg(
            Arg::new("unsafe")
                .long("unsafe")
                .action(ArgAction::SetTrue)
                .help("Disable safe mode and run destructive endpoints for real"),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .value_parser(value_parser!(PathBuf))
                .help("Explicit endpoint catalog (.json, .yaml or .yml)"),
        )
        .arg(
            Arg::new("discover")
                .long("discover")
                .action(ArgAction::SetTrue)
                .help("Discover endpoints from each service's API description"),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .value_parser(value_parser!(PathBuf))
                .help("Directory for JSON reports"),
        )
        .arg(
            Arg::new("id-selection")
                .long("id-selection")
                .value_parser(["first", "random"])
                .help("How live ids replace placeholders"),
        )
        .arg(
            Arg::new("exclude-fallback-failures")
                .long("exclude-fallback-failures")
                .action(ArgAction::SetTrue)
                .help("Leave failures that ran against a fallback id out of triage"),
        )
        .arg(
            Arg::new("no-auto-start")
                .long("no-auto-start")
                .action(ArgAction::SetTrue)
                .help("Fail instead of starting a dev server when the target is down"),
        )
        .arg(
            Arg::new("dev-command")
                .long("dev-command")
                .help("Dev server command; {port} is replaced by the target port"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Log level for gatecheck [default: info, or RUST_LOG]"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_parser(["pretty", "json"])
                .help("Log output format"),
        )
}

impl CliArgs {
    /// Parse an argument list
    ///
    /// # Errors
    /// Returns the clap error for unknown or malformed flags
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    /// Read flags from clap matches
    #[must_use]
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config: matches.get_one::<PathBuf>("config").cloned(),
            base_url: matches.get_one::<String>("base-url").cloned(),
            timeout_secs: matches.get_one::<u64>("timeout").copied(),
            concurrency: matches.get_one::<usize>("concurrency").copied(),
            unsafe_mode: matches.get_flag("unsafe"),
            catalog: matches.get_one::<PathBuf>("catalog").cloned(),
            discover: matches.get_flag("discover"),
            output_dir: matches.get_one::<PathBuf>("output-dir").cloned(),
            id_selection: matches
                .get_one::<String>("id-selection")
                .map(|s| match s.as_str() {
                    "random" => IdSelection::Random,
                    _ => IdSelection::First,
                }),
            exclude_fallback_failures: matches.get_flag("exclude-fallback-failures"),
            no_auto_start: matches.get_flag("no-auto-start"),
            dev_command: matches.get_one::<String>("dev-command").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            log_format: matches
                .get_one::<String>("log-format")
                .map(|s| if s == "json" { LogFormat::Json } else { LogFormat::Pretty }),
        }
    }

    /// Load the config file (or defaults), apply flags and validate
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be loaded or the merged
    /// configuration is invalid
    pub fn resolve_config(&self) -> Result<HarnessConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// Layer flags over a configuration
    #[must_use]
    pub fn apply(&self, mut config: HarnessConfig) -> HarnessConfig {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if self.unsafe_mode {
            config.safe_mode = false;
        }
        if self.catalog.is_some() || self.discover {
            config.catalog = CatalogSelection {
                file: self.catalog.clone().or(config.catalog.file),
                discover: self.discover || config.catalog.discover,
            };
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(selection) = self.id_selection {
            config.id_selection = selection;
        }
        if self.exclude_fallback_failures {
            config.exclude_fallback_id_failures = true;
        }
        if self.no_auto_start {
            config.auto_start = false;
        }
        if let Some(cmd) = &self.dev_command {
            config.dev_command = cmd.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        config
    }
}
