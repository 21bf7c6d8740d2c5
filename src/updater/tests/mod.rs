//! Test modules for update checking
//!
//! `helpers` is shared with the rollback tests.

pub(crate) mod helpers;
