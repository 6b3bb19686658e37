//! Shared encoding helpers

pub mod checksum;
pub mod datetime;
pub mod sector;
pub mod string;
