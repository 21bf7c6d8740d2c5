//! Test modules for plugin installation
//!
//! `helpers` is shared with the rollback tests.

pub(crate) mod helpers;
