pub mod processor;

pub use processor::{AsAny, ProcessOutcome, Processor};
