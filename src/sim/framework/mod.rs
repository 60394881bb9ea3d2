//! Module runtime used by the reference engine.
//!
//! A step runs a fixed sequence of [`SimModule`]s. Modules never talk to each
//! other directly; they read the scene through [`SimContext`] and exchange
//! results through the typed [`Bus`].

pub mod bus;
pub mod context;
pub mod module;
pub mod pipeline;

pub use bus::Bus;
pub use context::SimContext;
pub use module::SimModule;
pub use pipeline::Pipeline;
