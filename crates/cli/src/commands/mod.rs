pub mod debug;
pub mod migrate;
