use std::{fs, io, path::PathBuf};

use anyhow::anyhow;
use clap::Parser;
use graph_analytics::ExtractorConfig;
use tracing::Subscriber;
use tracing_subscriber::{registry::LookupSpan, Layer};

mod log;

pub(crate) use log::LogLevel;

use self::log::LogStyle;

pub(crate) type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

pub(crate) fn parse() -> Args {
    Args::parse()
}

#[derive(Debug, Parser)]
#[command(name = "graph-analytics", version)]
/// Converts newline-delimited JSON analytics records into GraphQL analytics records.
///
/// Converted records are written to the standard output, one JSON object per line.
pub(crate) struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short, env = "GRAPH_ANALYTICS_CONFIG_PATH")]
    config: Option<PathBuf>,
    /// File with one JSON analytics record per line. Defaults to the standard input.
    #[arg(long, short, env = "GRAPH_ANALYTICS_INPUT")]
    input: Option<PathBuf>,
    /// Set the logging level
    #[arg(long = "log", env = "GRAPH_ANALYTICS_LOG")]
    log_level: Option<LogLevel>,
    /// Set the style of log output
    #[arg(long, env = "GRAPH_ANALYTICS_LOG_STYLE", default_value_t = LogStyle::Text)]
    log_style: LogStyle,
    /// Abort at the first record that cannot be converted instead of skipping it
    #[arg(long)]
    fail_fast: bool,
}

impl Args {
    /// The extractor configuration, defaults without a configuration file.
    pub(crate) fn config(&self) -> anyhow::Result<ExtractorConfig> {
        let Some(path) = &self.config else {
            return Ok(ExtractorConfig::default());
        };

        let config = fs::read_to_string(path).map_err(|e| anyhow!("error loading config file {}:\n{e}", path.display()))?;

        toml::from_str(&config).map_err(|e| anyhow!("error parsing config file {}:\n{e}", path.display()))
    }

    pub(crate) fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    pub(crate) fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    pub(crate) fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Logs go to stderr, stdout carries the converted records.
    pub(crate) fn log_format<S>(&self) -> BoxedLayer<S>
    where
        S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
    {
        let layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

        match self.log_style {
            // for interactive terminals we provide colored output
            LogStyle::Text if atty::is(atty::Stream::Stderr) => layer.with_ansi(true).boxed(),
            LogStyle::Text => layer.with_ansi(false).boxed(),
            LogStyle::Json => layer.json().boxed(),
        }
    }
}
