pub mod memory_store;
pub mod upstream_server;
