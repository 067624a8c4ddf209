//! VM and session configuration.

/// Default operand stack size in 32-bit slots, pointer slot included.
pub const DEFAULT_STACK_CAPACITY: usize = 1024;

/// Default scratch memory size in bytes (one byte view of every stack slot).
pub const DEFAULT_SCRATCH_SIZE: usize = DEFAULT_STACK_CAPACITY * 4;

/// Default number of queued runs a session drains per call.
pub const DEFAULT_MAX_QUEUED_RUNS: usize = 64;

/// Sizing knobs for VMs and the sessions that create them.
///
/// ```
/// use bytedom::VmConfig;
///
/// let config = VmConfig::default().with_stack_capacity(64);
/// assert_eq!(config.stack_capacity, 64);
/// assert_eq!(config.scratch_size, 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Operand stack slots. Slot 0 holds the stack pointer, so a capacity of
    /// `n` leaves room for `n - 1` values. Every created node pushes its id,
    /// which bounds the nodes one VM can create.
    pub stack_capacity: usize,
    /// Bytes of scratch memory read by the stack-driven opcodes.
    pub scratch_size: usize,
    /// Upper bound on runs executed by one [`Session::drain`](crate::Session::drain).
    pub max_queued_runs: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            scratch_size: DEFAULT_SCRATCH_SIZE,
            max_queued_runs: DEFAULT_MAX_QUEUED_RUNS,
        }
    }
}

impl VmConfig {
    /// Sets the stack capacity. Values below 1 are raised to 1 (the pointer
    /// slot alone).
    #[must_use]
    pub fn with_stack_capacity(mut self, slots: usize) -> Self {
        self.stack_capacity = slots.max(1);
        self
    }

    #[must_use]
    pub fn with_scratch_size(mut self, bytes: usize) -> Self {
        self.scratch_size = bytes;
        self
    }

    #[must_use]
    pub fn with_max_queued_runs(mut self, runs: usize) -> Self {
        self.max_queued_runs = runs;
        self
    }
}
