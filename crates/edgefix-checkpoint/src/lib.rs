//! Checkpoint normalization: load a serialized name → tensor mapping, move
//! every tensor to host memory, and re-serialize.
//!
//! Loading tries a sequence of readers in decreasing strictness —
//! safetensors first, then legacy PyTorch pickle archives, then NumPy NPZ —
//! because the source artifact may have been written by an older or
//! differently configured serialization path. The first reader that
//! succeeds wins; the failures are surfaced together only when every
//! reader fails.
//!
//! Normalization guarantees:
//! - the output mapping has the same keys, in the same order, as the input
//! - every tensor is a freshly allocated host tensor (no aliasing of input
//!   storage), numerically identical element for element
//! - non-tensor values pass through untouched
//!
//! # Example
//!
//! ```no_run
//! use edgefix_checkpoint::normalize_checkpoint;
//! use std::path::Path;
//!
//! let report = normalize_checkpoint(
//!     Path::new("weights/resnet50.safetensors"),
//!     Path::new("weights/resnet50-fixed.safetensors"),
//! ).unwrap();
//! println!("normalized {} tensors via {}", report.tensors, report.strategy);
//! ```

mod error;
mod model;
mod normalize;
mod reader;
mod writer;

pub use error::{CheckpointError, Result};
pub use model::{Checkpoint, Value};
pub use normalize::{normalize_checkpoint, NormalizeReport};
pub use reader::{load_checkpoint, load_checkpoint_on, CheckpointReader};
pub use writer::save_checkpoint;
