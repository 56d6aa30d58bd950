//! Test fixtures: catalog rows for a few tenants.

use varejo_core::memory::MemoryEntityStore;
use varejo_core::scoping::catalog::{PRODUCT, PRODUCT_VARIANT, SALE, STOCK_MOVEMENT, STORE};
use varejo_core::{EntityDescriptor, Record};

/// Barcode of a product variant: two hops away from the tenant column.
pub static VARIANT_BARCODE: EntityDescriptor = EntityDescriptor::via_parent(
    "codigo_barras",
    "produtosestoques.codigos_barras",
    "produto_variacao_id",
    &PRODUCT_VARIANT,
);

pub fn store(store: &MemoryEntityStore, tenant: i64, name: &str) -> Record {
    store.seed(&STORE, Record::new().with("empresa_id", tenant).with("nome", name))
}

pub fn product(store: &MemoryEntityStore, tenant: i64, name: &str) -> Record {
    store.seed(
        &PRODUCT,
        Record::new()
            .with("empresa_id", tenant)
            .with("nome", name)
            .with("ativo", true),
    )
}

pub fn variant(store: &MemoryEntityStore, product: &Record, sku: &str) -> Record {
    store.seed(
        &PRODUCT_VARIANT,
        Record::new()
            .with("produto_id", product.id().unwrap())
            .with("sku_variacao", sku),
    )
}

pub fn barcode(store: &MemoryEntityStore, variant: &Record, code: &str) -> Record {
    store.seed(
        &VARIANT_BARCODE,
        Record::new()
            .with("produto_variacao_id", variant.id().unwrap())
            .with("codigo", code),
    )
}

pub fn movement(store: &MemoryEntityStore, loja: &Record, quantity: i64) -> Record {
    store.seed(
        &STOCK_MOVEMENT,
        Record::new()
            .with("loja_id", loja.id().unwrap())
            .with("tipo", "entrada")
            .with("quantidade", quantity),
    )
}

pub fn sale(store: &MemoryEntityStore, tenant: i64) -> Record {
    store.seed(&SALE, Record::new().with("empresa_id", tenant).with("status", "aberta"))
}
