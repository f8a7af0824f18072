//! gridcalc-core - UI-agnostic sheet documents, recalculation, sort and storage.

pub mod document;
pub mod edit;
pub mod error;
pub mod seed;
pub mod sort;
pub mod storage;
pub mod store;

pub use document::{Document, Recalculation};
pub use edit::Edit;
pub use error::{CoreError, Result};
pub use sort::{SortOptions, SortRange, SortRequest};
pub use store::{InMemorySheetStore, SheetStore};

pub use gridcalc_engine::engine::{CellRef, Sheet};
