// Allow specific clippy lints that are acceptable design decisions
#![allow(clippy::too_many_arguments)] // API design choice
#![allow(clippy::module_inception)] // Module organization choice

pub mod core;
