//! Tests for the CLI module
//!
//! Argument parsing, TOML configuration and output formatting.
