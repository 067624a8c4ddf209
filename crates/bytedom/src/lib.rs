//! `bytedom`: compact bytecode for DOM-like node trees
//!
//! `bytedom` encodes a tree of UI nodes into a small bytecode program and
//! executes that program against a pluggable host. It provides:
//!
//! - **Instruction set**: one-byte opcodes with length-prefixed operands
//! - **Encoder**: [`view`] node descriptors rendered through [`ProgramBuilder`]
//! - **Virtual machine**: a stack machine driving a [`Host`], with streaming
//!   input and optionally deferred sibling insertion
//! - **Patch engine**: a structural diff that turns two programs into a third
//!
//! # Architecture
//!
//! - **Encoding layer**: [`isa`], [`builder`], [`view`]
//! - **Execution layer**: [`vm`], [`callback`], [`host`], [`session`]
//! - **Tooling**: [`decode`] (decoder and disassembler), [`patch`],
//!   [`document`] (an in-memory host)
//!
//! # Example
//!
//! ```rust
//! use bytedom::view::{Button, Container, Render, Text};
//! use bytedom::{Document, Session};
//!
//! let mut session = Session::new(Document::new());
//! let tree = Container::new(vec![Text::new("hello").into()])
//!     .child(Button::new("ok").on(session.callbacks(), "click", || {}));
//!
//! let root = session.run(tree.render()?)?.unwrap();
//! assert_eq!(
//!     session.host().to_html(root),
//!     "<div>hello<button>ok</button></div>"
//! );
//! # Ok::<(), bytedom::Error>(())
//! ```

pub mod builder;
pub mod callback;
pub mod config;
pub mod decode;
pub mod document;
pub mod error;
pub mod host;
pub mod isa;
pub mod patch;
pub mod session;
pub mod view;
pub mod vm;

// Keys are small dense integers; FxHash is the cheaper hasher for them.
#[cfg(feature = "fx-hash")]
pub(crate) type Map<K, V> = hashbrown::HashMap<K, V, fxhash::FxBuildHasher>;

#[cfg(not(feature = "fx-hash"))]
pub(crate) type Map<K, V> = hashbrown::HashMap<K, V>;

// Re-export commonly used types
pub use builder::ProgramBuilder;
pub use callback::{Callback, CallbackStore, EventHandler};
pub use config::VmConfig;
pub use decode::{Decoded, Decoder, Instruction, Stop, decode, decode_at, disassemble};
pub use document::{Document, NodeId, NodeKind};
pub use error::{Error, Result};
pub use host::{Host, HostCapabilities};
pub use isa::Opcode;
pub use patch::patch;
pub use session::{RunQueue, Session};
pub use vm::{NodeTable, OperandStack, RunState, SlotId, Vm};
