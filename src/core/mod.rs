pub mod allocator;
pub mod engine;
pub mod partitioner;

pub use crate::domain::model::{Grouping, ReviewPairing, SlotRef, StudentId};
pub use crate::domain::ports::{ConfigProvider, RosterSource, Storage};
pub use crate::utils::error::Result;
