//! Grammar model for annotated binary message formats

pub mod production;
pub mod types;

pub use production::{Grammar, GrammarSource, Production, ProductionId};
pub use types::{Alternative, ByteSpec, Rhs, RhsItem, Terminal, MAX_DELIMITED_LEN};
