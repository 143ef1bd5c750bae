//! Value sources for argtree options.
//!
//! A value source supplies option values when an option does not appear on
//! the command line. This crate provides:
//!
//! - [`ConfigFileSource`]: a JSON or YAML document keyed by command path and
//!   option key.
//! - [`MapValueSource`]: an in-memory map, handy for tests and embedding.
//! - [`ChainedSource`]: several sources with fallback, e.g. a project config
//!   before a user config.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use argtree_core::{CommandDecl, ContextSettings, OptionDecl};
//! use argtree_parser::CommandLineParser;
//! use argtree_sources::{ChainedSource, ConfigFileSource};
//!
//! let chain = ChainedSource::new()
//!     .with_source(ConfigFileSource::from_file("tool.yaml").unwrap())
//!     .with_source(ConfigFileSource::from_file("/etc/tool.json").unwrap());
//! let settings = ContextSettings::default().with_value_source(Arc::new(chain));
//!
//! let root = CommandDecl::new("tool").with_option(OptionDecl::single(&["--jobs"]));
//! let finished = CommandLineParser::run(&root, &["--jobs", "2"], &settings).unwrap();
//! ```

mod chain;
mod config;
mod error;
mod map;

pub use chain::ChainedSource;
pub use config::{ConfigFileSource, ConfigFormat};
pub use error::{Result, SourceError};
pub use map::MapValueSource;
