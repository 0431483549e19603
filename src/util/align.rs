//! Utilities for aligning memory

use std::ops::{Add, Rem, Sub};

/// Align a value up to the next multiple of `alignment`. Values that are already aligned are returned unchanged.
/// An alignment of zero is treated as no alignment requirement.
pub fn align<T>(value: T, alignment: T) -> T
where
    T: Add<T, Output = T> + Sub<T, Output = T> + Rem<T, Output = T> + PartialEq + Default + Copy, {
    if alignment == T::default() {
        return value;
    }
    let unaligned = value % alignment;
    if unaligned == T::default() {
        value
    } else {
        value + (alignment - unaligned)
    }
}
