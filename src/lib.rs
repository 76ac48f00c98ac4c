pub mod config;
pub mod fetch;
pub mod freshness;
pub mod load;
pub mod process;
pub mod seeds;
pub mod table;
