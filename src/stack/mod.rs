//! Effect-resolution stack.
//!
//! Strict LIFO: effects raised by one event form a batch that is flushed onto
//! the stack together; the most recent batch resolves first. The effect
//! system drives popping and resolution.

mod priority;

pub use priority::EffectStack;
