//! Container catalog: public listings, admin edits and the admin table search.

pub mod models;
pub mod repo;
pub mod search;

pub use models::{Container, ContainerFields, ContainerInput, ContainerSize, Specification};
pub use repo::DeleteOutcome;
pub use search::{SearchTerm, search};
