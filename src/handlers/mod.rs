//! Handler implementations

pub mod console;
pub mod file;
pub mod rotating_file;
pub mod sink;
pub mod stream;

pub use console::{level_color, ColorLayer, ConsoleEmitter, ConsoleHandler};
pub use file::{FileEmitter, FileHandler, FileSink};
pub use rotating_file::{backup_path, RotatingFileEmitter, RotatingFileHandler, RotationPolicy};
pub use sink::{FaultReporter, MemorySink, Sink, SinkFault, WriterSink};
pub use stream::{StreamEmitter, StreamHandler};

// Re-export the capability traits next to their implementations
pub use crate::core::{Emit, Handleable};
