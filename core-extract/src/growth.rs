//! Capacity policy shared by the JSON and media buffers.

use bridge_traits::error::BridgeError;
use core_runtime::config::DEFAULT_GROWTH_QUANTUM;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Buffer growth to {requested} bytes failed")]
    AllocationFailed { requested: usize },

    #[error("Buffer length overflow")]
    Overflow,
}

impl From<BufferError> for BridgeError {
    fn from(err: BufferError) -> Self {
        BridgeError::SinkRejected(err.to_string())
    }
}

/// Capacity step. Growth always lands on the smallest multiple of the
/// quantum strictly greater than the required length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    quantum: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_GROWTH_QUANTUM)
    }
}

impl GrowthPolicy {
    /// A zero quantum selects the 1 MiB default.
    pub fn new(quantum: usize) -> Self {
        Self {
            quantum: if quantum == 0 {
                DEFAULT_GROWTH_QUANTUM
            } else {
                quantum
            },
        }
    }

    pub fn quantum(&self) -> usize {
        self.quantum
    }

    pub fn next_capacity(&self, required: usize) -> Option<usize> {
        (required / self.quantum)
            .checked_add(1)?
            .checked_mul(self.quantum)
    }
}

/// Byte storage with an explicitly tracked capacity.
///
/// `capacity` is the size the growth policy asked for; the allocation
/// behind `data` is at least that large.
#[derive(Debug, Default)]
pub(crate) struct GrowableBuffer {
    pub(crate) data: Vec<u8>,
    pub(crate) capacity: usize,
    policy: GrowthPolicy,
}

impl GrowableBuffer {
    pub(crate) fn new(policy: GrowthPolicy) -> Self {
        Self {
            data: Vec::new(),
            capacity: 0,
            policy,
        }
    }

    pub(crate) fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Reallocate so that at least `required` bytes fit.
    pub(crate) fn grow_to(&mut self, required: usize) -> Result<(), BufferError> {
        let target = self
            .policy
            .next_capacity(required)
            .ok_or(BufferError::Overflow)?;
        let additional = target.saturating_sub(self.data.len());
        self.data
            .try_reserve_exact(additional)
            .map_err(|_| BufferError::AllocationFailed { requested: target })?;

        debug!(from = self.capacity, to = target, "Buffer grown");
        self.capacity = target;
        Ok(())
    }
}
