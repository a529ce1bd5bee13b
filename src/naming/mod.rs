//! File naming: sanitizing header text, canonical email names and
//! collision-free destinations.

pub mod rename;
pub mod sanitize;
pub mod unique;
