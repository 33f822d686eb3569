pub mod category;
pub mod celebration;
pub mod clock;
pub mod filter;
pub mod form;
pub mod habit;
pub mod scheduler;
pub mod storage;
pub mod store;

pub use crate::store::{HabitStore, HabitStoreBuilder};
