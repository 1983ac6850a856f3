pub mod amounts;
pub mod calldata;
pub mod config;
pub mod explorer;
pub mod id_generator;
pub mod logging;
