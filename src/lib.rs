pub mod error;

pub mod catalog;
pub mod storage;

pub mod config;
pub mod sql;
