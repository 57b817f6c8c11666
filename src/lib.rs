pub mod cli;
pub mod detect;
pub mod error;
pub mod ingest;
pub mod locator;
pub mod measures;
pub mod model;
pub mod parsers;
pub mod sources;
pub mod xml;
