//! System Use Sharing Protocol extensions

pub mod rock_ridge;
