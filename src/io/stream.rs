//! Classifier streams.
//!
//! The trainer writes finished trees to a [`ClassifierOutputStream`]; the
//! ensemble classifier reads them back from a [`ClassifierInputStream`].
//! Both directions are implemented by the in-memory [`Forest`] and by the
//! file-backed reader/writer pair over the native format.

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use crate::data::Feature;
use crate::repr::{DecisionTree, Forest};

use super::native::{
    read_frame, read_header, write_frame, DeserializeError, FormatHeader, SerializeError,
};
use super::payload::TreePayload;

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by classifier streams.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Write attempted on a closed output stream.
    #[error("stream is closed")]
    Closed,

    /// Failure while writing to the underlying sink.
    #[error(transparent)]
    Write(#[from] SerializeError),

    /// Failure while reading or validating a persisted model.
    #[error(transparent)]
    Read(#[from] DeserializeError),
}

// ============================================================================
// Stream traits
// ============================================================================

/// A rewindable, forward-only sequence of tree classifiers.
///
/// The ensemble classifier rewinds the stream before every classification
/// pass and requires exclusive access for the span of one `classify` call.
pub trait ClassifierInputStream<F: Feature> {
    /// Number of classes the streamed classifiers distinguish.
    fn class_count(&self) -> usize;

    /// Number of features the streamed classifiers expect.
    fn feature_count(&self) -> usize;

    /// Reset iteration to the first classifier.
    fn rewind(&mut self) -> Result<(), StreamError>;

    /// The next classifier, or `None` at the end of the stream.
    fn next_classifier(&mut self) -> Result<Option<Arc<DecisionTree<F>>>, StreamError>;
}

/// An append-only sink of tree classifiers.
///
/// `close` is idempotent; the first call flushes and releases the underlying
/// sink. Writing after close fails with [`StreamError::Closed`]. Dropping an
/// unclosed stream releases it on a best-effort basis, so release happens on
/// every exit path.
pub trait ClassifierOutputStream<F: Feature> {
    /// Append one finished tree.
    fn write_tree(&mut self, tree: &DecisionTree<F>) -> Result<(), StreamError>;

    /// Flush and release the underlying sink.
    fn close(&mut self) -> Result<(), StreamError>;
}

// ============================================================================
// In-memory forest streams
// ============================================================================

impl<F: Feature> ClassifierInputStream<F> for Forest<F> {
    fn class_count(&self) -> usize {
        Forest::class_count(self) as usize
    }

    fn feature_count(&self) -> usize {
        Forest::feature_count(self) as usize
    }

    fn rewind(&mut self) -> Result<(), StreamError> {
        self.cursor = 0;
        Ok(())
    }

    fn next_classifier(&mut self) -> Result<Option<Arc<DecisionTree<F>>>, StreamError> {
        if self.cursor >= self.tree_count() {
            return Ok(None);
        }
        let tree = self.tree(self.cursor).clone();
        self.cursor += 1;
        Ok(Some(tree))
    }
}

impl<F: Feature> ClassifierOutputStream<F> for Forest<F> {
    fn write_tree(&mut self, tree: &DecisionTree<F>) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        self.push_tree(tree.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.closed = true;
        Ok(())
    }
}

// ============================================================================
// File-backed writer
// ============================================================================

/// Append-only writer of a forest model file.
///
/// The header is written on creation; each tree becomes one checksummed
/// frame. An I/O failure leaves every previously written frame valid.
#[derive(Debug)]
pub struct ForestFileWriter<F: Feature> {
    writer: Option<BufWriter<File>>,
    _feature: PhantomData<F>,
}

impl<F: Feature> ForestFileWriter<F> {
    /// Create the model file and write its header.
    pub fn create(
        path: impl AsRef<Path>,
        class_count: u32,
        feature_count: u32,
    ) -> Result<Self, StreamError> {
        let file = File::create(path).map_err(SerializeError::Io)?;
        let mut writer = BufWriter::new(file);
        let header = FormatHeader::new(F::KIND, class_count, feature_count);
        writer
            .write_all(&header.to_bytes())
            .map_err(SerializeError::Io)?;
        Ok(Self {
            writer: Some(writer),
            _feature: PhantomData,
        })
    }
}

impl<F: Feature> ClassifierOutputStream<F> for ForestFileWriter<F> {
    fn write_tree(&mut self, tree: &DecisionTree<F>) -> Result<(), StreamError> {
        let writer = self.writer.as_mut().ok_or(StreamError::Closed)?;
        let result = postcard::to_allocvec(&TreePayload::from_tree(tree))
            .map_err(SerializeError::Encoding)
            .and_then(|payload| write_frame(writer, &payload));
        if result.is_err() {
            // A failed write closes the stream; frames written before it
            // remain valid on disk.
            self.writer = None;
        }
        result.map_err(StreamError::from)
    }

    fn close(&mut self) -> Result<(), StreamError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(SerializeError::Io)?;
        }
        Ok(())
    }
}

impl<F: Feature> Drop for ForestFileWriter<F> {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

// ============================================================================
// File-backed reader
// ============================================================================

/// Reader of a persisted forest, usable as a classifier input stream.
///
/// The first `preload` trees are decoded eagerly and served from memory on
/// every pass; the remainder is re-read (and re-validated) from the file
/// after each rewind.
#[derive(Debug)]
pub struct ForestFileReader<F: Feature> {
    header: FormatHeader,
    preloaded: Vec<Arc<DecisionTree<F>>>,
    reader: BufReader<File>,
    /// File offset of the first frame after the preloaded ones.
    tail_start: u64,
    cursor: usize,
}

impl<F: Feature> ForestFileReader<F> {
    /// Open a model file, validate its header, and preload up to `preload`
    /// trees.
    pub fn open(path: impl AsRef<Path>, preload: usize) -> Result<Self, StreamError> {
        let file = File::open(path).map_err(DeserializeError::Io)?;
        let mut reader = BufReader::new(file);

        let header = read_header(&mut reader)?;
        if header.scalar != F::KIND {
            return Err(DeserializeError::WrongScalarKind {
                expected: F::KIND,
                actual: header.scalar,
            }
            .into());
        }

        let mut preloaded = Vec::new();
        for _ in 0..preload {
            match Self::read_tree(&mut reader, &header)? {
                Some(tree) => preloaded.push(Arc::new(tree)),
                None => break,
            }
        }
        let tail_start = reader.stream_position().map_err(DeserializeError::Io)?;

        Ok(Self {
            header,
            preloaded,
            reader,
            tail_start,
            cursor: 0,
        })
    }

    fn read_tree(
        reader: &mut BufReader<File>,
        header: &FormatHeader,
    ) -> Result<Option<DecisionTree<F>>, StreamError> {
        let Some(frame) = read_frame(reader)? else {
            return Ok(None);
        };
        let payload: TreePayload<F> =
            postcard::from_bytes(&frame).map_err(DeserializeError::Decoding)?;
        let tree = payload
            .into_tree(header.class_count, header.feature_count)
            .map_err(DeserializeError::InvalidTree)?;
        Ok(Some(tree))
    }
}

impl<F: Feature> ClassifierInputStream<F> for ForestFileReader<F> {
    fn class_count(&self) -> usize {
        self.header.class_count as usize
    }

    fn feature_count(&self) -> usize {
        self.header.feature_count as usize
    }

    fn rewind(&mut self) -> Result<(), StreamError> {
        self.cursor = 0;
        self.reader
            .seek(SeekFrom::Start(self.tail_start))
            .map_err(DeserializeError::Io)?;
        Ok(())
    }

    fn next_classifier(&mut self) -> Result<Option<Arc<DecisionTree<F>>>, StreamError> {
        if self.cursor < self.preloaded.len() {
            let tree = self.preloaded[self.cursor].clone();
            self.cursor += 1;
            return Ok(Some(tree));
        }
        match Self::read_tree(&mut self.reader, &self.header)? {
            Some(tree) => {
                self.cursor += 1;
                Ok(Some(Arc::new(tree)))
            }
            None => Ok(None),
        }
    }
}
