use tracing::debug;

use crate::api::types::StoreSummary;

/// Known stores and the one chat queries run against.
#[derive(Debug, Default, Clone)]
pub struct StoreSelector {
    stores: Vec<StoreSummary>,
    active: Option<String>,
}

impl StoreSelector {
    pub fn new(active: Option<String>) -> Self {
        Self {
            stores: Vec::new(),
            active: active.filter(|name| !name.is_empty()),
        }
    }

    /// Replaces the list; the active store stays selected only if it is still
    /// listed. A preselected name is kept while the list is still empty so a
    /// store given on the command line survives the initial load failing.
    pub fn replace(&mut self, stores: Vec<StoreSummary>) {
        self.stores = stores;
        if self.stores.is_empty() {
            return;
        }
        if let Some(active) = &self.active {
            if !self.stores.iter().any(|s| &s.name == active) {
                debug!("Active store {} is gone, clearing selection", active);
                self.active = None;
            }
        }
    }

    pub fn select(&mut self, name: &str) -> bool {
        if self.stores.iter().any(|s| s.name == name) {
            self.active = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_label(&self) -> Option<&str> {
        let active = self.active.as_deref()?;
        Some(
            self.stores
                .iter()
                .find(|s| s.name == active)
                .map(|s| s.label())
                .unwrap_or(active),
        )
    }

    pub fn stores(&self) -> &[StoreSummary] {
        &self.stores
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

/// Human-readable byte count (1024-based, up to GB).
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut exponent = 0;
    let mut scale = 1u64;
    while exponent + 1 < UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        exponent += 1;
    }
    let value = bytes as f64 / scale as f64;
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(name: &str, display: Option<&str>) -> StoreSummary {
        StoreSummary {
            name: name.to_string(),
            display_name: display.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_selection_survives_refresh() {
        let mut selector = StoreSelector::new(None);
        selector.replace(vec![store("fileSearchStores/a", Some("Alpha")), store("fileSearchStores/b", None)]);
        assert!(selector.select("fileSearchStores/b"));
        assert_eq!(selector.active_label(), Some("fileSearchStores/b"));

        selector.replace(vec![store("fileSearchStores/b", Some("Beta"))]);
        assert_eq!(selector.active(), Some("fileSearchStores/b"));
        assert_eq!(selector.active_label(), Some("Beta"));

        selector.replace(vec![store("fileSearchStores/c", None)]);
        assert_eq!(selector.active(), None);
    }

    #[test]
    fn test_preselected_store_kept_until_list_arrives() {
        let mut selector = StoreSelector::new(Some("fileSearchStores/x".into()));
        selector.replace(Vec::new());
        assert_eq!(selector.active(), Some("fileSearchStores/x"));
        assert_eq!(selector.active_label(), Some("fileSearchStores/x"));
    }

    #[test]
    fn test_unknown_store_not_selectable() {
        let mut selector = StoreSelector::new(None);
        selector.replace(vec![store("fileSearchStores/a", None)]);
        assert!(!selector.select("fileSearchStores/zzz"));
        assert_eq!(selector.active(), None);
        assert!(selector.select("fileSearchStores/a"));
        assert_eq!(selector.active(), Some("fileSearchStores/a"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1 MB");
    }
}
