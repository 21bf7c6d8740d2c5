//! Test modules for the rollback orchestrator

mod helpers;

mod orchestrator;
