pub mod error;
pub mod consts;
pub mod frame;
pub mod io;
pub mod filters;
pub mod stats;
pub mod dark;
pub mod ramp;
pub mod centroid;
pub mod trajectory;
pub mod photometry;
pub mod bootstrap;
pub mod pipeline;
