//! Reply generation collaborator boundary.

pub mod generator;

pub use generator::{Generator, MockGenerator, TokenStream};
