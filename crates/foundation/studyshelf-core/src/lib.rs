//! studyshelf-core -- domain model and storage seams.
//!
//! Subjects contain Chapters, Chapters contain Exercises, and any of the
//! three levels can own Materials. This crate holds the entity types, the
//! error taxonomy shared by every tier, the [`EntityStore`] trait that the
//! data tier implements, and an in-memory store for tests and local runs.

pub mod error;
pub mod memory;
pub mod model;
pub mod store;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use model::{
    Chapter, Exercise, Material, MaterialKind, NewMaterial, NewUser, ParentRef, Role, Subject,
    User,
};
pub use store::EntityStore;
