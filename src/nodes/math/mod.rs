//! Math operation nodes

pub mod add;

pub use add::AddNodeFactory;
