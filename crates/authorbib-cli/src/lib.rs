//! authorbib CLI - Command-line interface library
//!
//! This library provides the CLI functionality for authorbib:
//! - Generate: Fetch, match, render and write every author's PDF
//! - Check: Validate the configuration and show resolved output paths
//! - Match: Fetch and match only, printing per-author counts
//!
//! # Binary Usage
//!
//! ```bash
//! # Nightly run, deployment values from the environment
//! WP_UPLOADS_PATH=/var/www/wp-content/uploads SITE_ID=3 authorbib generate
//!
//! # Validate a config before deploying it
//! authorbib --config site3.toml check
//!
//! # See who would get which items, as JSON
//! authorbib match --format json
//! ```

pub mod app;

pub use app::{check_command, generate_command, match_command, run_cli, OutputFormat};
pub use app::{EXIT_AUTHOR_FAILED, EXIT_FATAL};
