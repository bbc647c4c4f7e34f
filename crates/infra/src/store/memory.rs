//! In-memory store implementations.
//!
//! Intended for tests/dev and as the reference semantics for a database
//! backend. Not optimized for performance.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use almacen_core::{AggregateRoot, ExpectedVersion, IngresoId, ProductId};
use almacen_ingresos::Ingreso;
use almacen_kardex::{KardexEntry, TimeRange};
use almacen_stock::StockRecord;

use super::{CounterStore, IngresoStore, KardexStore, StockStore, StoreError};

fn poisoned(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{what} lock poisoned"))
}

/// In-memory versioned stock records.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    records: RwLock<HashMap<ProductId, StockRecord>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockStore for InMemoryStockStore {
    fn get(&self, product_id: ProductId) -> Result<Option<StockRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("stock"))?;
        Ok(records.get(&product_id).cloned())
    }

    fn put(&self, record: StockRecord, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned("stock"))?;
        let current = records
            .get(&record.product_id())
            .map(|r| r.version())
            .unwrap_or(0);
        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "stock record for product {} expected {expected:?}, found {current}",
                record.product_id()
            )));
        }
        records.insert(record.product_id(), record);
        Ok(())
    }

    fn list(&self) -> Result<Vec<StockRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("stock"))?;
        let mut all: Vec<StockRecord> = records.values().cloned().collect();
        all.sort_by_key(StockRecord::product_id);
        Ok(all)
    }
}

/// In-memory versioned goods receipts.
#[derive(Debug, Default)]
pub struct InMemoryIngresoStore {
    ingresos: RwLock<HashMap<IngresoId, Ingreso>>,
}

impl InMemoryIngresoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IngresoStore for InMemoryIngresoStore {
    fn get(&self, ingreso_id: IngresoId) -> Result<Option<Ingreso>, StoreError> {
        let ingresos = self.ingresos.read().map_err(|_| poisoned("ingresos"))?;
        Ok(ingresos.get(&ingreso_id).cloned())
    }

    fn put(&self, ingreso: Ingreso, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut ingresos = self.ingresos.write().map_err(|_| poisoned("ingresos"))?;
        let id = ingreso.id_typed();
        let current = ingresos.get(&id).map(|i| i.version()).unwrap_or(0);
        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "ingreso {id} expected {expected:?}, found {current}"
            )));
        }
        ingresos.insert(id, ingreso);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Ingreso>, StoreError> {
        let ingresos = self.ingresos.read().map_err(|_| poisoned("ingresos"))?;
        let mut all: Vec<Ingreso> = ingresos.values().cloned().collect();
        all.sort_by_key(Ingreso::id_typed);
        Ok(all)
    }
}

/// In-memory append-only kardex log.
#[derive(Debug, Default)]
pub struct InMemoryKardexStore {
    entries: RwLock<Vec<KardexEntry>>,
}

impl InMemoryKardexStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KardexStore for InMemoryKardexStore {
    fn append(&self, entry: KardexEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned("kardex"))?;
        entries.push(entry);
        Ok(())
    }

    fn history(
        &self,
        product_id: ProductId,
        range: TimeRange,
    ) -> Result<Vec<KardexEntry>, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned("kardex"))?;
        let mut matching: Vec<KardexEntry> = entries
            .iter()
            .filter(|e| e.product_id == product_id && range.contains(e.occurred_at))
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.record_version);
        Ok(matching)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned("kardex"))?;
        Ok(entries.len())
    }
}

/// In-memory named counters.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, u64>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for InMemoryCounterStore {
    fn increment(&self, counter: &str) -> Result<u64, StoreError> {
        let mut counters = self.counters.lock().map_err(|_| poisoned("counters"))?;
        let value = counters.entry(counter.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    fn current(&self, counter: &str) -> Result<u64, StoreError> {
        let counters = self.counters.lock().map_err(|_| poisoned("counters"))?;
        Ok(counters.get(counter).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almacen_core::{Aggregate, UserId};
    use almacen_stock::{AdjustStock, StockCommand};
    use chrono::Utc;

    fn adjusted_record(product: u64, delta: i64) -> StockRecord {
        let mut record = StockRecord::empty(ProductId::new(product));
        let event = record
            .handle(&StockCommand::Adjust(AdjustStock {
                product_id: ProductId::new(product),
                delta,
                motivo: "seed".to_string(),
                actor_id: UserId::new(1),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        record.apply(&event);
        record
    }

    #[test]
    fn stock_put_enforces_expected_version() {
        let store = InMemoryStockStore::new();
        let record = adjusted_record(1, 10);

        store.put(record.clone(), ExpectedVersion::Exact(0)).unwrap();

        // Stale writer loses.
        let err = store
            .put(record.clone(), ExpectedVersion::Exact(0))
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        // And the stored record is untouched.
        let stored = store.get(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.version(), 1);
    }

    #[test]
    fn counter_increments_are_dense_from_one() {
        let store = InMemoryCounterStore::new();
        assert_eq!(store.current("productos").unwrap(), 0);
        assert_eq!(store.increment("productos").unwrap(), 1);
        assert_eq!(store.increment("productos").unwrap(), 2);
        // Independent counters do not interfere.
        assert_eq!(store.increment("ingresos").unwrap(), 1);
        assert_eq!(store.current("productos").unwrap(), 2);
    }
}
