use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::loader::{ingest_bytes, FileKind, SheetLayout};
use super::model::CaseTable;
use crate::config::DashboardConfig;
use crate::error::IngestResult;

// ---------------------------------------------------------------------------
// Ingestion memo, keyed by file content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    digest: [u8; 32],
    kind: FileKind,
    layout: SheetLayout,
}

/// Content-addressed memo of ingested tables. Loading the same bytes again
/// returns the cached table; failures are not cached.
#[derive(Debug, Default)]
pub struct IngestCache {
    entries: HashMap<CacheKey, Arc<CaseTable>>,
}

impl IngestCache {
    pub fn get_or_ingest(
        &mut self,
        bytes: &[u8],
        kind: FileKind,
        layout: SheetLayout,
        config: &DashboardConfig,
    ) -> IngestResult<Arc<CaseTable>> {
        let key = CacheKey {
            digest: Sha256::digest(bytes).into(),
            kind,
            layout,
        };
        if let Some(table) = self.entries.get(&key) {
            log::debug!("Ingestion cache hit ({} cases)", table.len());
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(ingest_bytes(bytes, kind, layout, config)?);
        self.entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Forget every cached table ("Substituir Planilha").
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &[u8] = b"CLASSE,DIAS CONCLUSO\nA,1\nB,2\n";

    #[test]
    fn same_bytes_hit_the_cache() {
        let cfg = DashboardConfig::default();
        let mut cache = IngestCache::default();
        let a = cache
            .get_or_ingest(CSV, FileKind::Csv, SheetLayout::plain(), &cfg)
            .unwrap();
        let b = cache
            .get_or_ingest(CSV, FileKind::Csv, SheetLayout::plain(), &cfg)
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn layout_is_part_of_the_key() {
        let cfg = DashboardConfig::default();
        let mut cache = IngestCache::default();
        let plain = cache
            .get_or_ingest(CSV, FileKind::Csv, SheetLayout::plain(), &cfg)
            .unwrap();
        let conclusos = cache
            .get_or_ingest(CSV, FileKind::Csv, SheetLayout::conclusos(), &cfg)
            .unwrap();
        assert_eq!(plain.len(), 2);
        assert_eq!(conclusos.len(), 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_forgets_and_errors_are_not_cached() {
        let cfg = DashboardConfig::default();
        let mut cache = IngestCache::default();
        cache
            .get_or_ingest(CSV, FileKind::Csv, SheetLayout::plain(), &cfg)
            .unwrap();
        cache.clear();
        assert!(cache.is_empty());

        assert!(cache
            .get_or_ingest(b"junk", FileKind::Workbook, SheetLayout::plain(), &cfg)
            .is_err());
        assert!(cache.is_empty());
    }
}
