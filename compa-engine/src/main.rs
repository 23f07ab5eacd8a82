//! compa - Compensation adjustment engine CLI
//!
//! Seeds tenant adjustment matrices, runs individual calculations, processes
//! bulk workbook uploads, and lists persisted results.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use compa_common::config::EngineConfig;
use compa_common::{db::init::init_database, resolve_tenant_scope, Role};
use compa_engine::services::sheet::ColumnLayout;
use compa_engine::{BulkProcessor, CalcRequest, Calculator, FileStorage, MatrixService};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "compa", version, about = "Compensation adjustment engine")]
struct Cli {
    /// Config file path (falls back to COMPA_CONFIG, then ./compa.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tenant the caller belongs to
    #[arg(long, global = true, default_value = "default")]
    tenant: String,

    /// Caller role for tenant scoping
    #[arg(long, global = true, value_enum, default_value_t = RoleArg::TenantAdmin)]
    role: RoleArg,

    /// Operate on another tenant (super admins only)
    #[arg(long, global = true)]
    target_tenant: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    SuperAdmin,
    TenantAdmin,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::SuperAdmin => Role::SuperAdmin,
            RoleArg::TenantAdmin => Role::TenantAdmin,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Seed the default adjustment matrix for a tenant
    Seed,
    /// Calculate one salary adjustment
    Calc {
        #[arg(long)]
        employee_code: String,
        #[arg(long)]
        job_title: Option<String>,
        #[arg(long)]
        years: i64,
        #[arg(long)]
        rating: i64,
        #[arg(long)]
        current_salary: f64,
        #[arg(long)]
        mid_of_scale: f64,
        /// As-of date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Process a bulk upload workbook
    Bulk {
        /// Input .xlsx/.xls file
        #[arg(long)]
        input: PathBuf,
        /// Where to write the annotated result workbook
        #[arg(long)]
        output: Option<PathBuf>,
        /// Input has an employee-name column after the code
        #[arg(long)]
        with_employee_name: bool,
    },
    /// List persisted calculation results
    Results {
        /// Restrict to one batch id
        #[arg(long)]
        batch: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
    /// Show the upload-history ledger
    Uploads {
        /// Restrict to one batch id
        #[arg(long)]
        batch: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting compa v{}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::load(cli.config.as_deref())?;
    info!("Database: {}", config.database_path.display());

    let pool = init_database(&config.database_path).await?;
    let storage = FileStorage::new(&config.storage_root);

    let tenant = resolve_tenant_scope(cli.role.into(), &cli.tenant, cli.target_tenant.as_deref())?;

    match cli.command {
        Command::Seed => {
            let count = MatrixService::new(pool).seed_defaults(&tenant).await?;
            println!("Seeded {count} matrix cells for tenant {tenant}");
        }
        Command::Calc {
            employee_code,
            job_title,
            years,
            rating,
            current_salary,
            mid_of_scale,
            as_of,
        } => {
            let outcome = Calculator::new(pool)
                .calculate(
                    &tenant,
                    &CalcRequest {
                        employee_code,
                        employee_name: None,
                        job_title,
                        years_experience: years,
                        performance_rating: rating,
                        current_salary,
                        mid_of_scale,
                        as_of,
                    },
                )
                .await?;
            println!("compa ratio:  {:.6}", outcome.compa_ratio);
            println!("band:         {}", outcome.compa_label);
            println!("increase:     {}%", outcome.increase_pct);
            println!("new salary:   {:.2}", outcome.new_salary);
        }
        Command::Bulk {
            input,
            output,
            with_employee_name,
        } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("cannot read input file {}", input.display()))?;
            let file_name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.xlsx".to_string());
            let layout = if with_employee_name {
                ColumnLayout::with_employee_name()
            } else {
                ColumnLayout::standard()
            };

            let processor = BulkProcessor::new(pool, storage, &config);
            let response = processor
                .process(&tenant, &file_name, &bytes, layout)
                .await?;

            println!("batch:   {}", response.batch_id);
            println!("total:   {}", response.total_rows);
            println!("success: {}", response.success_count);
            println!("errors:  {}", response.error_count);

            if let Some(path) = output {
                let result = processor.load_result_file(&tenant, &response.batch_id)?;
                std::fs::write(&path, result)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                println!("result workbook written to {}", path.display());
            }
        }
        Command::Results { batch, page } => {
            let rows = match batch {
                Some(batch_id) => {
                    compa_engine::db::results::find_by_batch(&pool, &tenant, &batch_id).await?
                }
                None => {
                    let (rows, pagination) =
                        compa_engine::db::results::find_by_tenant(&pool, &tenant, page).await?;
                    println!("page {}/{}", pagination.page, pagination.total_pages);
                    rows
                }
            };
            for r in &rows {
                println!(
                    "{}  {}  {}  {} -> {} ({}%)",
                    r.batch_id, r.employee_code, r.compa_label, r.current_salary, r.new_salary,
                    r.increase_pct
                );
            }
            println!("{} rows", rows.len());
        }
        Command::Uploads { batch } => match batch {
            Some(batch_id) => {
                match compa_engine::db::history::find_by_batch(&pool, &tenant, &batch_id).await? {
                    Some(h) => println!(
                        "{}  {}  {}  total {} success {} errors {} ({} ms)",
                        h.batch_id,
                        h.status,
                        h.file_name,
                        h.total_rows,
                        h.success_count,
                        h.error_count,
                        h.processing_ms
                    ),
                    None => println!("no upload found for batch {batch_id}"),
                }
            }
            None => {
                let uploads = compa_engine::db::history::list_by_tenant(&pool, &tenant).await?;
                for h in &uploads {
                    println!(
                        "{}  {}  {}  total {} success {} errors {}",
                        h.batch_id, h.status, h.file_name, h.total_rows, h.success_count,
                        h.error_count
                    );
                }
                println!("{} uploads", uploads.len());
            }
        },
    }

    Ok(())
}
