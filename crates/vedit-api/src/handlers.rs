//! Request handlers.

pub mod editor;
pub mod health;
pub mod videos;

pub use editor::*;
pub use health::*;
pub use videos::*;
