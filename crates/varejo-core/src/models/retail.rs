//! Typed views over the retail entities of the catalog.
//!
//! Field names follow the domain in English; the serde renames map them to the
//! persisted column names. Timestamps are left out on purpose: they stay
//! available on the underlying [`Record`](super::Record).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TenantId;

/// Store ("loja") of a tenant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub id: i64,
    #[serde(rename = "empresa_id")]
    pub tenant_id: Option<TenantId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cnpj", default)]
    pub tax_id: Option<String>,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "ativo", default)]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "empresa_id")]
    pub tenant_id: Option<TenantId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "ativo", default)]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "empresa_id")]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "categoria_id", default)]
    pub category_id: Option<i64>,
    #[serde(rename = "preco_custo", default)]
    pub cost_price: Option<Decimal>,
    #[serde(rename = "preco_venda", default)]
    pub sale_price: Option<Decimal>,
    #[serde(rename = "ativo", default)]
    pub active: bool,
    #[serde(rename = "controle_estoque", default)]
    pub tracks_stock: bool,
}

/// Colour offered for product variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Color {
    pub id: i64,
    #[serde(rename = "empresa_id")]
    pub tenant_id: Option<TenantId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "codigo_hex", default)]
    pub hex_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub id: i64,
    #[serde(rename = "empresa_id")]
    pub tenant_id: Option<TenantId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
    /// Display position within its kind.
    #[serde(rename = "ordem", default)]
    pub position: Option<i64>,
}

/// Size/colour variant of a product; scoped through its product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductVariant {
    pub id: i64,
    #[serde(rename = "produto_id")]
    pub product_id: Option<i64>,
    #[serde(rename = "sku_variacao", default)]
    pub sku: Option<String>,
    #[serde(rename = "preco_adicional", default)]
    pub extra_price: Option<Decimal>,
    #[serde(rename = "ativo", default)]
    pub active: bool,
}

/// Inventory movement; scoped through its store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockMovement {
    pub id: i64,
    #[serde(rename = "loja_id")]
    pub store_id: Option<i64>,
    #[serde(rename = "produto_variacao_id")]
    pub variant_id: Option<i64>,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "quantidade_anterior", default)]
    pub quantity_before: Option<i64>,
    #[serde(rename = "quantidade_atual", default)]
    pub quantity_after: Option<i64>,
    #[serde(rename = "motivo", default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: i64,
    #[serde(rename = "empresa_id")]
    pub tenant_id: Option<TenantId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
    #[serde(rename = "cpf_cnpj", default)]
    pub document: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "ativo", default)]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Supplier {
    pub id: i64,
    #[serde(rename = "empresa_id")]
    pub tenant_id: Option<TenantId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cpf_cnpj", default)]
    pub document: Option<String>,
    #[serde(rename = "ativo", default)]
    pub active: bool,
}

/// Goods receipt ("entrada de mercadoria") registered against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoodsReceipt {
    pub id: i64,
    #[serde(rename = "empresa_id")]
    pub tenant_id: Option<TenantId>,
    #[serde(rename = "loja_id", default)]
    pub store_id: Option<i64>,
    #[serde(rename = "fornecedor_id", default)]
    pub supplier_id: Option<i64>,
    #[serde(rename = "numero_nota", default)]
    pub invoice_number: Option<String>,
    #[serde(rename = "valor_total", default)]
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoodsReceiptItem {
    pub id: i64,
    #[serde(rename = "entrada_mercadoria_id")]
    pub receipt_id: Option<i64>,
    #[serde(rename = "produto_variacao_id")]
    pub variant_id: Option<i64>,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "preco_unitario", default)]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sale {
    pub id: i64,
    #[serde(rename = "empresa_id")]
    pub tenant_id: Option<TenantId>,
    #[serde(rename = "loja_id", default)]
    pub store_id: Option<i64>,
    #[serde(rename = "cliente_id", default)]
    pub customer_id: Option<i64>,
    #[serde(rename = "numero_venda", default)]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(rename = "forma_pagamento", default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleItem {
    pub id: i64,
    #[serde(rename = "venda_id")]
    pub sale_id: Option<i64>,
    #[serde(rename = "produto_variacao_id")]
    pub variant_id: Option<i64>,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "preco_unitario", default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: i64,
    #[serde(rename = "venda_id")]
    pub sale_id: Option<i64>,
    #[serde(rename = "forma_pagamento", default)]
    pub method: Option<String>,
    #[serde(rename = "valor", default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
}
