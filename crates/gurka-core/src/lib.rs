#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod fields;
pub mod report;
pub mod traits;
pub mod types;
