pub mod app;
pub mod codec;
pub mod config;
pub mod culture;
pub mod deadline;
pub mod humanize;
pub mod ledger;
pub mod observability;
pub mod remote; // MockRemote is exposed for tests
pub mod storage;
