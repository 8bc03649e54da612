use std::fmt;

use clap::ValueEnum;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    /// Completely disables logging
    Off,
    /// Only errors from the converter
    Error,
    /// Warnings and errors from the converter, failed records included
    Warn,
    /// Info, warning and error messages from the converter
    #[default]
    Info,
    /// Debug messages from the converter, skipped records and selections included
    Debug,
    /// Trace, debug, info, warning and error messages from all dependencies
    Trace,
}

impl LogLevel {
    pub(crate) fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "graph_analytics=error,off",
            LogLevel::Warn => "graph_analytics=warn,off",
            LogLevel::Info => "graph_analytics=info,off",
            LogLevel::Debug => "graph_analytics=debug,off",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogStyle {
    /// Standard text
    Text,
    /// JSON objects
    Json,
}

impl AsRef<str> for LogStyle {
    fn as_ref(&self) -> &str {
        match self {
            LogStyle::Text => "text",
            LogStyle::Json => "json",
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}
