//! Entity descriptors and scoping strategies.

use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Column holding the tenant id on directly scoped entities.
pub const TENANT_COLUMN: &str = "empresa_id";

/// How an entity type is tied to a tenant.
#[derive(Debug, Clone, Copy)]
pub enum ScopingStrategy {
    /// The row carries the tenant id itself.
    DirectColumn { column: &'static str },
    /// The row belongs to a parent entity and inherits the parent's tenant.
    /// The parent may itself be scoped directly or through its own parent.
    ViaParent {
        foreign_key: &'static str,
        parent: &'static EntityDescriptor,
    },
}

/// Static description of a persisted entity type.
pub struct EntityDescriptor {
    /// Short name used in logs and errors.
    pub name: &'static str,
    /// Fully qualified table name.
    pub table: &'static str,
    pub id_column: &'static str,
    pub scoping: ScopingStrategy,
    /// Deletes set `deleted_at` instead of removing the row.
    pub soft_delete: bool,
    /// The table maintains `updated_at`.
    pub timestamps: bool,
}

impl EntityDescriptor {
    pub const fn direct(name: &'static str, table: &'static str) -> Self {
        Self {
            name,
            table,
            id_column: "id",
            scoping: ScopingStrategy::DirectColumn {
                column: TENANT_COLUMN,
            },
            soft_delete: false,
            timestamps: true,
        }
    }

    pub const fn via_parent(
        name: &'static str,
        table: &'static str,
        foreign_key: &'static str,
        parent: &'static EntityDescriptor,
    ) -> Self {
        Self {
            name,
            table,
            id_column: "id",
            scoping: ScopingStrategy::ViaParent {
                foreign_key,
                parent,
            },
            soft_delete: false,
            timestamps: true,
        }
    }

    pub const fn soft_deleting(mut self) -> Self {
        self.soft_delete = true;
        self
    }

    pub const fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// The tenant column when this entity is scoped directly.
    pub fn tenant_column(&self) -> Option<&'static str> {
        match self.scoping {
            ScopingStrategy::DirectColumn { column } => Some(column),
            ScopingStrategy::ViaParent { .. } => None,
        }
    }

    /// The foreign key and parent when this entity is scoped transitively.
    pub fn parent_link(&self) -> Option<(&'static str, &'static EntityDescriptor)> {
        match self.scoping {
            ScopingStrategy::DirectColumn { .. } => None,
            ScopingStrategy::ViaParent {
                foreign_key,
                parent,
            } => Some((foreign_key, parent)),
        }
    }

    /// Number of parent hops between this entity and its tenant column.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some((_, parent)) = current.parent_link() {
            depth += 1;
            current = parent;
        }
        depth
    }

    pub fn is_same(&self, other: &EntityDescriptor) -> bool {
        std::ptr::eq(self, other) || self.table == other.table
    }
}

impl Debug for EntityDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut s = f.debug_struct("EntityDescriptor");
        s.field("name", &self.name).field("table", &self.table);
        match self.scoping {
            ScopingStrategy::DirectColumn { column } => s.field("tenant_column", &column),
            ScopingStrategy::ViaParent {
                foreign_key,
                parent,
            } => s
                .field("foreign_key", &foreign_key)
                .field("parent", &parent.name),
        };
        s.field("soft_delete", &self.soft_delete).finish()
    }
}
