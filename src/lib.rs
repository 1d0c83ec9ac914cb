pub mod config;
pub mod env;
pub mod interactive;
pub mod mail;
pub mod pipeline;
pub mod plan;
pub mod printer;
pub mod report;
pub mod results;
pub mod runner;
