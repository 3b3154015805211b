// Library for tests to access modules

pub mod aggregator;
pub mod cli;
pub mod collector;
pub mod config;
pub mod docker_repo;
pub mod error;
pub mod exposition;
pub mod models;
pub mod node_exporter_repo;
pub mod poller;
pub mod reducer;
pub mod sink;
pub mod sources;
pub mod version;
