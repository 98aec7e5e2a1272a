//! Feature scalar abstraction.
//!
//! A forest is monomorphic in its feature type: every tree of a model splits
//! on the same scalar kind, and the kind is recorded in the persisted model
//! header so readers can dispatch before decoding any tree.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

/// Scalar kind tag stored in the model header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScalarKind {
    /// Single-precision float features.
    F32 = 0,
    /// Double-precision float features.
    F64 = 1,
}

impl ScalarKind {
    /// Convert from u8, returning None for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::F32),
            1 => Some(Self::F64),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::F32 => write!(f, "f32"),
            ScalarKind::F64 => write!(f, "f64"),
        }
    }
}

/// A feature scalar the engine can split on.
///
/// Implemented for `f32` and `f64`. Integral feature columns are fed as
/// floats; exactness is preserved for the integer ranges tabular data
/// realistically covers.
pub trait Feature:
    Copy
    + PartialOrd
    + Default
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
    + 'static
{
    /// Scalar kind tag for the persisted model header.
    const KIND: ScalarKind;

    /// A NaN feature value is a client error, detected at index build time.
    fn is_nan(self) -> bool;

    /// Widen to f64 for impurity arithmetic and reporting.
    fn to_f64(self) -> f64;
}

impl Feature for f32 {
    const KIND: ScalarKind = ScalarKind::F32;

    #[inline]
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Feature for f64 {
    const KIND: ScalarKind = ScalarKind::F64;

    #[inline]
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}
