//! Navigation-list synchronization.
//!
//! Fetching server truth and reconciling it into display rows are kept
//! separate: the fetch half talks to the backend through [`ApiClient`], the
//! reconcile half is a pure function of the fetched entities plus the
//! current-selection id. [`NavSync`] owns exactly two regions (symbols,
//! captures) and every refresh fully replaces its own rows, never an
//! incremental diff, so repeated refreshes cannot accumulate duplicates.

use crate::actions;
use crate::client::ApiClient;
use crate::models::{Capture, Symbol};
use crate::transport::ApiError;
use std::collections::HashSet;

pub const NO_SYMBOLS: &str = "no symbols found";
pub const NO_CAPTURES: &str = "no captures found";

/// One display row. Selection is a display property computed during
/// reconciliation, never stored on the entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    /// Server id; `None` for the empty-list placeholder.
    pub id: Option<String>,
    pub label: String,
    pub selected: bool,
}

impl NavEntry {
    fn placeholder(label: &str) -> Self {
        Self {
            id: None,
            label: label.to_string(),
            selected: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }
}

/// Server order is kept, duplicate ids are dropped, an empty list renders
/// as a single placeholder row.
pub fn reconcile_symbols(symbols: &[Symbol], current: Option<&str>) -> Vec<NavEntry> {
    if symbols.is_empty() {
        return vec![NavEntry::placeholder(NO_SYMBOLS)];
    }
    let mut seen = HashSet::new();
    symbols
        .iter()
        .filter(|s| seen.insert(s.id.as_str()))
        .map(|s| NavEntry {
            id: Some(s.id.clone()),
            label: s.name.clone(),
            selected: current == Some(s.id.as_str()),
        })
        .collect()
}

pub fn reconcile_captures(captures: &[Capture]) -> Vec<NavEntry> {
    if captures.is_empty() {
        return vec![NavEntry::placeholder(NO_CAPTURES)];
    }
    let mut seen = HashSet::new();
    captures
        .iter()
        .filter(|c| seen.insert(c.id.as_str()))
        .map(|c| NavEntry {
            id: Some(c.id.clone()),
            label: c.name.clone(),
            selected: false,
        })
        .collect()
}

/// Owns the rendered navigation rows and keeps them consistent with the
/// backend across asynchronous round trips.
#[derive(Debug, Default)]
pub struct NavSync {
    symbols: Vec<NavEntry>,
    captures: Vec<NavEntry>,
}

impl NavSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> &[NavEntry] {
        &self.symbols
    }

    pub fn captures(&self) -> &[NavEntry] {
        &self.captures
    }

    /// Refresh both regions. The list fetches run concurrently and each
    /// updates only its own region, so completion order does not matter. A
    /// failed fetch leaves its region's previous rows in place; the first
    /// failure is returned after both fetches settle.
    pub async fn refresh(
        &mut self,
        api: &ApiClient,
        current_symbol: Option<&str>,
    ) -> Result<(), ApiError> {
        let (symbols, captures) = futures::join!(
            actions::list_symbols(api, api.default_page()),
            actions::list_captures(api, api.default_page()),
        );
        let mut first_err = None;
        match symbols {
            Ok(list) => self.symbols = reconcile_symbols(&list, current_symbol),
            Err(e) => first_err = Some(e),
        }
        match captures {
            Ok(list) => self.captures = reconcile_captures(&list),
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Refresh only the symbol region.
    pub async fn refresh_symbols(
        &mut self,
        api: &ApiClient,
        current_symbol: Option<&str>,
    ) -> Result<(), ApiError> {
        let list = actions::list_symbols(api, api.default_page()).await?;
        self.symbols = reconcile_symbols(&list, current_symbol);
        Ok(())
    }

    /// Refresh only the capture region.
    pub async fn refresh_captures(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        let list = actions::list_captures(api, api.default_page()).await?;
        self.captures = reconcile_captures(&list);
        Ok(())
    }

    /// Create a symbol, then re-sync the symbol region with the new entry
    /// selected. The refresh is issued only after the create resolves, so
    /// the re-rendered list is never stale. `Ok` tells the originating
    /// input it can close and reset; on `Err` nothing was re-rendered.
    pub async fn create_symbol(
        &mut self,
        api: &ApiClient,
        name: &str,
    ) -> Result<Symbol, ApiError> {
        let created = actions::create_symbol(api, name).await?;
        self.refresh_symbols(api, Some(&created.id)).await?;
        Ok(created)
    }
}
