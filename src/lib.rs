pub mod drawing;
pub mod error;
pub mod geometry;
pub mod model;
pub mod persistence;
pub mod settings;
pub mod source;
pub mod store;
pub mod undoable;

pub use error::{Error, Result};
