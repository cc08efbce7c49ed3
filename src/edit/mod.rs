//! Work-tree transformations applied by the bulk pipeline.

pub mod copy;
pub mod depr;
pub mod replace;

pub use copy::CopyFileEdit;
pub use depr::DeprEdit;
pub use replace::{ReplaceEdit, SwapPair};
