// Download pipeline: one module per stage plus the state machine that sequences them.

pub mod destination;
pub mod hotpatch;
pub mod manifest;
pub mod materializer;
pub mod pipeline;
pub mod planner;
pub mod resolver;
pub mod stats;
