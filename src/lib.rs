//! envcfg - YAML environment configuration loader.
//!
//! This library provides:
//! - A YAML loader with `!include`, `!template`, `!optional_template` and
//!   `!tuple` directives
//! - Recursive include expansion with deterministic deep-merge precedence
//! - Strict and optional `$`-placeholder template substitution
//! - A `Config` facade with target option, tool and path accessors
//!
//! # Example
//!
//! ```no_run
//! use envcfg::config::{Config, LoadOptions};
//!
//! let config = Config::load_with("env/board.yaml", LoadOptions::default()).unwrap();
//! let baudrate = config.get_target_option("main", "baudrate").unwrap();
//! println!("baudrate: {:?}", baudrate);
//! println!("flash tool: {}", config.get_tool("flashrom").display());
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod features;
pub mod paths;

pub use config::{Config, LoadOptions};
pub use document::{Value, dump};
pub use error::{ConfigError, LookupError, Result};
