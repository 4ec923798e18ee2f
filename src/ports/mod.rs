pub mod cache;
pub mod catalog;
pub mod queue;
pub mod storage;
pub mod store;
