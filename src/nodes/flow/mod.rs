//! Exec-chain boundary nodes

pub mod end;
pub mod start;

pub use end::BuildEndNodeFactory;
pub use start::BuildStartNodeFactory;
