//! Sessions: one host, one callback store, many runs.
//!
//! Callbacks frequently want to render something new. They never drive a VM
//! themselves; they capture a [`RunQueue`] handle and push programs onto it.
//! The owner of the [`Session`] later calls [`Session::drain`], which runs at
//! most [`VmConfig::max_queued_runs`] programs and leaves the rest queued.

use crate::callback::CallbackStore;
use crate::config::VmConfig;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::vm::{RunState, Vm};
use bytedom_log::{debug, warn};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// FIFO of programs waiting to run. Cloning yields another handle to the
/// same queue.
#[derive(Debug, Clone, Default)]
pub struct RunQueue {
    programs: Rc<RefCell<VecDeque<Vec<u8>>>>,
}

impl RunQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, program: impl Into<Vec<u8>>) {
        self.programs.borrow_mut().push_back(program.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.borrow().is_empty()
    }

    fn pop(&self) -> Option<Vec<u8>> {
        self.programs.borrow_mut().pop_front()
    }
}

/// Owns a host together with the callback store its listeners resolve into.
pub struct Session<H: Host> {
    host: H,
    callbacks: CallbackStore,
    queue: RunQueue,
    config: VmConfig,
}

impl<H: Host> Session<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, VmConfig::default())
    }

    pub fn with_config(host: H, config: VmConfig) -> Self {
        Self {
            host,
            callbacks: CallbackStore::new(),
            queue: RunQueue::new(),
            config,
        }
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The store `on(..)` registrations for this session must go into.
    #[must_use]
    pub fn callbacks(&self) -> &CallbackStore {
        &self.callbacks
    }

    /// A handle callbacks can capture to schedule follow-up programs.
    #[must_use]
    pub fn queue(&self) -> RunQueue {
        self.queue.clone()
    }

    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// A fresh VM bound to this session's callback store and sizing, for
    /// callers that drive execution themselves (streaming, stack-driven
    /// opcodes).
    pub fn vm(&self, program: impl Into<Vec<u8>>) -> Vm<H> {
        Vm::with_config(program, &self.host, self.callbacks.clone(), &self.config)
    }

    /// Runs `program` to completion on a fresh VM, applies its deferred
    /// sibling insertions, and returns the root: the last live node.
    ///
    /// `program` must be complete. One that ends inside an instruction fails
    /// with [`Error::TruncatedProgram`] after the instructions before it have
    /// been applied; feed partial input through [`Session::vm`] instead.
    pub fn run(&mut self, program: impl Into<Vec<u8>>) -> Result<Option<H::Node>> {
        let mut vm = self.vm(program);
        let state = vm.run(&mut self.host)?;
        vm.flush_deferred(&mut self.host);
        if state == RunState::Pending {
            return Err(Error::TruncatedProgram { offset: vm.pc() });
        }
        Ok(vm.peek().cloned())
    }

    /// Runs queued programs in order, at most `max_queued_runs` of them, and
    /// returns the roots they produced.
    ///
    /// A failing program stops the drain; programs queued behind it stay
    /// queued.
    pub fn drain(&mut self) -> Result<Vec<H::Node>> {
        let mut roots = Vec::new();
        let mut runs = 0;
        while runs < self.config.max_queued_runs {
            let Some(program) = self.queue.pop() else {
                break;
            };
            runs += 1;
            if let Some(root) = self.run(program)? {
                roots.push(root);
            }
        }
        if runs > 0 {
            debug!("drained {runs} queued run(s)");
        }
        if !self.queue.is_empty() {
            warn!(
                "run budget of {} exhausted, {} program(s) left queued",
                self.config.max_queued_runs,
                self.queue.len()
            );
        }
        Ok(roots)
    }
}
