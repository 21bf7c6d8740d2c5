pub mod app;
pub mod core;
pub mod install;
pub mod rollback;
pub mod updater;
