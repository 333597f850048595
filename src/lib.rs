pub mod analyzers;
pub mod config;
pub mod learner;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod schema;
