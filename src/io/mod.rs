//! Persistence and classifier streams.
//!
//! A persisted forest is a fixed-size header followed by one length-prefixed,
//! checksummed frame per tree. Frames are appended incrementally, so every
//! prefix of a model file is itself a valid (smaller) model: trees already
//! written survive a later I/O failure.

mod native;
mod payload;
mod stream;

pub use native::{
    read_model_header, DeserializeError, FormatHeader, SerializeError, CURRENT_VERSION_MAJOR,
    CURRENT_VERSION_MINOR, HEADER_SIZE, MAGIC,
};
pub use payload::TreePayload;
pub use stream::{
    ClassifierInputStream, ClassifierOutputStream, ForestFileReader, ForestFileWriter, StreamError,
};
