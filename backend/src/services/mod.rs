//! Session layer tying the repository, selector and algorithms together.

pub mod explorer;

pub use explorer::{ExplorerSession, Selection};
