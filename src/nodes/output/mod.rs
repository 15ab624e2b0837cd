//! Output nodes

pub mod print;

pub use print::PrintNodeFactory;
