//! Overflow-checked byte and length arithmetic.
//!
//! Pure functions. Every count the array machinery turns into a byte size
//! goes through [`byte_size`]; every concatenation total goes through
//! [`total_count`]. Neither ever wraps.

use sprawl_core::AllocFailure;

/// `count × element_size` in bytes.
///
/// # Errors
///
/// [`AllocFailure::ByteSizeOverflow`] if the product does not fit in `usize`.
pub fn byte_size(element_size: usize, count: usize) -> Result<usize, AllocFailure> {
    element_size
        .checked_mul(count)
        .ok_or(AllocFailure::ByteSizeOverflow {
            element_size,
            count,
        })
}

/// Sum of per-source element counts.
///
/// A scalar source contributes a length of one; callers pass it as such.
///
/// # Errors
///
/// [`AllocFailure::LengthOverflow`] if the sum does not fit in `usize`.
pub fn total_count<I>(lengths: I) -> Result<usize, AllocFailure>
where
    I: IntoIterator<Item = usize>,
{
    let mut total = 0usize;
    let mut sources = 0usize;
    for len in lengths {
        sources += 1;
        total = total
            .checked_add(len)
            .ok_or(AllocFailure::LengthOverflow { sources })?;
    }
    Ok(total)
}
