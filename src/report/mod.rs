pub mod record;
pub mod sink;

pub use record::BootTimeRecord;
pub use sink::{JsonLinesSink, LogSink, ResultSink};
