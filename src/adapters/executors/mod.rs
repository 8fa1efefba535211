//! Sample executor implementations.

pub mod mock;

pub use mock::{MockExecutor, MockProfile};
