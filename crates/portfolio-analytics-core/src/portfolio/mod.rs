pub mod allocation;
pub mod income;
pub mod ranking;
pub mod records;
pub mod returns;
pub mod snapshot;
