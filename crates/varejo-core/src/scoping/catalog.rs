//! Scoping registrations for the retail entities.

use super::entity::EntityDescriptor;

pub static STORE: EntityDescriptor =
    EntityDescriptor::direct("loja", "multitenancy.lojas").soft_deleting();

pub static CATEGORY: EntityDescriptor =
    EntityDescriptor::direct("categoria", "produtosestoques.categorias").soft_deleting();

pub static PRODUCT: EntityDescriptor =
    EntityDescriptor::direct("produto", "produtosestoques.produtos").soft_deleting();

pub static COLOR: EntityDescriptor =
    EntityDescriptor::direct("cor", "produtosestoques.cores").soft_deleting();

pub static SIZE: EntityDescriptor =
    EntityDescriptor::direct("tamanho", "produtosestoques.tamanhos").soft_deleting();

pub static PRODUCT_VARIANT: EntityDescriptor = EntityDescriptor::via_parent(
    "produto_variacao",
    "produtosestoques.produto_variacoes",
    "produto_id",
    &PRODUCT,
)
.soft_deleting();

/// Movements carry no tenant column; they belong to whichever tenant owns the store.
pub static STOCK_MOVEMENT: EntityDescriptor = EntityDescriptor::via_parent(
    "movimentacao_estoque",
    "produtosestoques.movimentacoes_estoque",
    "loja_id",
    &STORE,
);

pub static CUSTOMER: EntityDescriptor =
    EntityDescriptor::direct("cliente", "vendasfinanceiro.clientes").soft_deleting();

pub static SUPPLIER: EntityDescriptor =
    EntityDescriptor::direct("fornecedor", "gestao.fornecedores");

pub static GOODS_RECEIPT: EntityDescriptor =
    EntityDescriptor::direct("entrada_mercadoria", "gestao.entradas_mercadoria");

pub static GOODS_RECEIPT_ITEM: EntityDescriptor = EntityDescriptor::via_parent(
    "entrada_mercadoria_item",
    "gestao.entrada_mercadoria_itens",
    "entrada_mercadoria_id",
    &GOODS_RECEIPT,
);

pub static SALE: EntityDescriptor =
    EntityDescriptor::direct("venda", "vendasfinanceiro.vendas").soft_deleting();

pub static SALE_ITEM: EntityDescriptor = EntityDescriptor::via_parent(
    "venda_item",
    "vendasfinanceiro.venda_itens",
    "venda_id",
    &SALE,
);

pub static PAYMENT: EntityDescriptor = EntityDescriptor::via_parent(
    "pagamento",
    "vendasfinanceiro.pagamentos",
    "venda_id",
    &SALE,
)
.soft_deleting();

pub static ALL: [&EntityDescriptor; 14] = [
    &STORE,
    &CATEGORY,
    &PRODUCT,
    &COLOR,
    &SIZE,
    &PRODUCT_VARIANT,
    &STOCK_MOVEMENT,
    &CUSTOMER,
    &SUPPLIER,
    &GOODS_RECEIPT,
    &GOODS_RECEIPT_ITEM,
    &SALE,
    &SALE_ITEM,
    &PAYMENT,
];

/// Look up a registered entity by its short name or table name.
pub fn lookup(name: &str) -> Option<&'static EntityDescriptor> {
    let name = name.trim();
    ALL.iter()
        .copied()
        .find(|e| e.name.eq_ignore_ascii_case(name) || e.table.eq_ignore_ascii_case(name))
        .or_else(|| {
            ALL.iter()
                .copied()
                .find(|e| e.table.rsplit('.').next() == Some(name))
        })
}
