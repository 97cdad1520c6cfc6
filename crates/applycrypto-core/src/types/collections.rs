//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;
pub use std::collections::BTreeMap;

/// SmallVec for annotation arguments and column sets (usually <4).
pub type SmallVec4<T> = SmallVec<[T; 4]>;

/// SmallVec for placement lists (usually 1 or 2).
pub type SmallVec2<T> = SmallVec<[T; 2]>;
