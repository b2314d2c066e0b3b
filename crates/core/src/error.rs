//! Error types for the wind simulation core
//!
//! Almost everything in the engine clamps bad input instead of failing, so a
//! dropped frame never becomes a crashed session. The one thing that can
//! genuinely fail is reserving memory for a grid or particle arena, which the
//! driver answers by falling back to the Low quality tier.

/// Errors that can occur while building or resizing simulation buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A buffer of the given element count could not be reserved
    AllocationFailed {
        /// Number of elements requested
        len: usize,
    },
    /// Grid dimensions overflowed `usize` when multiplied together
    InvalidDimensions {
        /// Requested grid width in cells
        width: usize,
        /// Requested grid height in cells
        height: usize,
    },
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::AllocationFailed { len } => {
                write!(f, "Failed to allocate buffer of {len} elements")
            }
            SimError::InvalidDimensions { width, height } => {
                write!(f, "Invalid grid dimensions {width}x{height}")
            }
        }
    }
}

impl std::error::Error for SimError {}

/// Allocate a zero-filled buffer, reporting allocation failure instead of aborting
///
/// # Errors
///
/// Returns [`SimError::AllocationFailed`] if the allocator refuses the reservation.
pub(crate) fn zeroed_buffer<T: Copy + Default>(len: usize) -> Result<Vec<T>, SimError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| SimError::AllocationFailed { len })?;
    buffer.resize(len, T::default());
    Ok(buffer)
}
