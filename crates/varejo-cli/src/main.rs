//! Tenancy diagnostics CLI.
//!
//! Talks to the database named by `DATABASE_URL` and runs the same resolution
//! and scoping code the services use, printing the outcome as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::PgPool;
use varejo_cli::{
    init_tracing, principal_from_args, report_failure, ResolutionReport, TenantSummary,
};
use varejo_core::context::{AccessPolicy, RequestContextStore, RoleExemption};
use varejo_core::scoping::catalog;
use varejo_core::{
    Record, TenancyConfig, TenantAwareRepository, TenantContextResolver, TenantDirectory,
    TenantId,
};
use varejo_db::{connect, PgEntityStore, PgTenantDirectory};

#[derive(Parser)]
#[command(name = "varejo")]
#[command(about = "Inspect tenant resolution and tenant-scoped data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List companies that are active right now
    Tenants,
    /// Resolve the tenant context for a user
    Resolve {
        /// User ID of the principal
        #[arg(long)]
        user: i64,

        /// Tenant the user belongs to, if any
        #[arg(long)]
        user_tenant: Option<i64>,

        /// Tenant requested explicitly ("view as")
        #[arg(long)]
        tenant: Option<i64>,

        /// Roles held by the user (repeatable)
        #[arg(long = "role", value_name = "ROLE")]
        roles: Vec<String>,
    },
    /// List rows of an entity as seen by one tenant
    Query {
        /// Entity name or table, e.g. `venda` or `vendasfinanceiro.vendas`
        entity: String,

        /// Tenant to scope the listing to
        #[arg(long)]
        tenant: i64,

        /// Maximum rows to return
        #[arg(long, default_value = "50")]
        limit: i64,

        /// Rows to skip
        #[arg(long, default_value = "0")]
        offset: i64,

        /// Include soft-deleted rows
        #[arg(long)]
        with_trashed: bool,
    },
    /// List the known entities and how each is scoped
    Entities,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct EntityRow {
    name: &'static str,
    table: &'static str,
    scoping: String,
    depth: usize,
    soft_delete: bool,
}

async fn open() -> anyhow::Result<(TenancyConfig, PgPool)> {
    let config = TenancyConfig::from_env().context("Failed to load configuration")?;
    let pool = connect(&config).await?;
    Ok((config, pool))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let report = report_failure(&err);
            match serde_json::to_string_pretty(&report) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}: {}", report.code, report.message),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Entities => {
            let rows: Vec<EntityRow> = catalog::ALL
                .iter()
                .map(|entity| EntityRow {
                    name: entity.name,
                    table: entity.table,
                    scoping: match entity.parent_link() {
                        Some((foreign_key, parent)) => {
                            format!("{} -> {}", foreign_key, parent.name)
                        }
                        None => format!("direct ({})", entity.tenant_column().unwrap_or_default()),
                    },
                    depth: entity.depth(),
                    soft_delete: entity.soft_delete,
                })
                .collect();
            print_json(&rows)?;
        }
        Commands::Tenants => {
            let (_, pool) = open().await?;
            let tenants = PgTenantDirectory::new(pool).list_active().await?;
            let summaries: Vec<TenantSummary> = tenants.iter().map(TenantSummary::from).collect();
            print_json(&summaries)?;
        }
        Commands::Resolve {
            user,
            user_tenant,
            tenant,
            roles,
        } => {
            let (config, pool) = open().await?;
            let principal = principal_from_args(user, user_tenant, &roles);
            let policy = Arc::new(RoleExemption::from_config(&config));
            let exempt = policy.is_exempt(&principal);
            let resolver = TenantContextResolver::new(
                Arc::new(RequestContextStore::new()),
                Arc::new(PgTenantDirectory::new(pool)),
                Some(principal),
            )
            .with_policy(policy);

            match tenant {
                Some(id) => {
                    resolver.set_explicit_id(TenantId(id)).await?;
                }
                None => {
                    resolver.resolve_from_principal().await?;
                }
            }

            let resolved = resolver.current().await?;
            let report = ResolutionReport {
                user_id: user,
                exempt,
                requested: tenant.map(TenantId),
                resolved: resolved.as_ref().map(TenantSummary::from),
                has_context: resolver.has_context().await?,
            };
            print_json(&report)?;
        }
        Commands::Query {
            entity,
            tenant,
            limit,
            offset,
            with_trashed,
        } => {
            let descriptor = catalog::lookup(&entity)
                .with_context(|| format!("Unknown entity: {}", entity))?;
            let (config, pool) = open().await?;
            let store = PgEntityStore::new(pool.clone());
            let resolver = TenantContextResolver::new(
                Arc::new(RequestContextStore::new()),
                Arc::new(PgTenantDirectory::new(pool)),
                None,
            )
            .with_policy(Arc::new(RoleExemption::from_config(&config)));
            let helper = TenantAwareRepository::new(&resolver, &store);

            let rows: Vec<Record> = helper
                .run_as(TenantId(tenant), || async {
                    let mut query = helper
                        .query_for_current_tenant(descriptor)
                        .await?
                        .limit(limit)
                        .offset(offset);
                    if with_trashed {
                        query = query.with_trashed();
                    }
                    helper.fetch(&query).await
                })
                .await?;

            tracing::info!(
                entity = descriptor.name,
                tenant_id = tenant,
                rows = rows.len(),
                "Query finished"
            );
            print_json(&rows)?;
        }
    }

    Ok(())
}
