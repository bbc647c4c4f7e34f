use std::collections::HashMap;
use std::sync::RwLock;

use almacen_core::{DomainError, DomainResult, ProductId};

use crate::product::Product;

/// Read-only product lookup consumed by the ledger and the receipt workflow.
///
/// Catalog management (create/edit/deactivate) is an external collaborator;
/// the core never writes through this trait.
pub trait ProductCatalog: Send + Sync {
    fn get(&self, product_id: ProductId) -> DomainResult<Option<Product>>;

    /// Resolve a product that must exist and be active for a stock-affecting
    /// operation.
    fn require_active(&self, product_id: ProductId) -> DomainResult<Product> {
        let product = self.get(product_id)?.ok_or(DomainError::NotFound)?;
        if !product.active {
            return Err(DomainError::validation(format!(
                "product {product_id} is inactive"
            )));
        }
        Ok(product)
    }
}

/// In-memory catalog; the `seed`/`upsert` side is test/bootstrap plumbing,
/// not part of the read-only core contract.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.upsert(product);
        }
        catalog
    }

    pub fn upsert(&self, product: Product) {
        if let Ok(mut products) = self.products.write() {
            products.insert(product.id, product);
        }
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn get(&self, product_id: ProductId) -> DomainResult<Option<Product>> {
        let products = self
            .products
            .read()
            .map_err(|_| DomainError::storage("catalog lock poisoned"))?;
        Ok(products.get(&product_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{ProductKind, StockThresholds};

    fn product(id: u64, active: bool) -> Product {
        let mut p = Product::new(
            ProductId::new(id),
            format!("P-{id:04}"),
            "Filtro de aceite",
            ProductKind::Repuesto,
            "unidad",
            StockThresholds::new(5, 50, 2).unwrap(),
        )
        .unwrap();
        p.active = active;
        p
    }

    #[test]
    fn require_active_rejects_unknown_product() {
        let catalog = InMemoryCatalog::new();
        let err = catalog.require_active(ProductId::new(9)).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn require_active_rejects_inactive_product() {
        let catalog = InMemoryCatalog::seed([product(1, false)]);
        let err = catalog.require_active(ProductId::new(1)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn require_active_returns_active_product() {
        let catalog = InMemoryCatalog::seed([product(2, true)]);
        let found = catalog.require_active(ProductId::new(2)).unwrap();
        assert_eq!(found.code, "P-0002");
    }
}
