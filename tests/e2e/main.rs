//! E2E test suite entry point.

mod maintenance_workflow;
mod rebuild_workflow;
mod retrieval_workflow;
