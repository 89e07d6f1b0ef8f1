pub mod bootstrap;
pub mod config;
pub mod info;
pub mod photometry;
pub mod run;
pub mod scan;
pub mod track;

pub mod csv;
pub mod progress;
