//! Sheet storage keyed by sheet id.

use crate::error::{CoreError, Result};
use dashmap::DashMap;
use gridcalc_engine::engine::Sheet;

/// Storage and retrieval of sheets by id.
pub trait SheetStore {
    fn get(&self, id: &str) -> Option<Sheet>;

    /// Replace a stored sheet. Fails with `SheetNotFound` if `sheet.id` is unknown.
    fn update(&self, sheet: Sheet) -> Result<()>;

    /// Store a sheet, returning the one it replaced.
    fn insert(&self, sheet: Sheet) -> Option<Sheet>;

    fn remove(&self, id: &str) -> Option<Sheet>;

    /// Stored ids, sorted.
    fn ids(&self) -> Vec<String>;
}

/// Process-local store. Each entry is locked independently, so one sheet can
/// be updated while others are read.
#[derive(Debug, Default)]
pub struct InMemorySheetStore {
    sheets: DashMap<String, Sheet>,
}

impl InMemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the given sheets.
    pub fn with_sheets(sheets: impl IntoIterator<Item = Sheet>) -> Self {
        let store = Self::new();
        for sheet in sheets {
            store.insert(sheet);
        }
        store
    }
}

impl SheetStore for InMemorySheetStore {
    fn get(&self, id: &str) -> Option<Sheet> {
        self.sheets.get(id).map(|entry| entry.value().clone())
    }

    fn update(&self, sheet: Sheet) -> Result<()> {
        match self.sheets.get_mut(&sheet.id) {
            Some(mut entry) => {
                *entry = sheet;
                Ok(())
            }
            None => Err(CoreError::SheetNotFound(sheet.id)),
        }
    }

    fn insert(&self, sheet: Sheet) -> Option<Sheet> {
        self.sheets.insert(sheet.id.clone(), sheet)
    }

    fn remove(&self, id: &str) -> Option<Sheet> {
        self.sheets.remove(id).map(|(_, sheet)| sheet)
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sheets.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }
}
