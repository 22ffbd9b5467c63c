//! SchemaMend - idempotent schema repair runner
//!
//! Operational entrypoint: load configuration from the environment, read a
//! JSON repair plan, run it against the target database, print the full
//! report in execution order, and exit non-zero if any statement failed.

use schemamend::config::Settings;
use schemamend::db;
use schemamend::plan::RepairPlan;
use schemamend::runner::Runner;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🔧 Starting SchemaMend repair run...");

    // Load configuration
    let settings = Settings::load()?;

    // Plan path: first CLI argument wins, then REPAIR_PLAN, then the default
    let plan_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| settings.runner.plan_path.clone());
    let plan = RepairPlan::from_path(&plan_path)?;
    info!(
        "📋 Loaded plan '{}' ({} statements, checksum {}) from {}",
        plan.name,
        plan.statements.len(),
        &plan.checksum()[..12],
        plan_path
    );

    // Connection-level failures here and below are fatal; the report only
    // ever carries per-statement outcomes.
    let pool = db::connect(&settings.database).await?;

    let runner = Runner::postgres().fail_fast(settings.runner.fail_fast);
    let report = runner.run_pool(&plan, &pool).await?;

    // Full report first, verdict last
    report.emit();

    if report.has_failures() {
        error!("❌ Repair run finished with failures: {}", report.summary());
        return Ok(ExitCode::FAILURE);
    }

    info!("✅ Repair run complete: {}", report.summary());
    Ok(ExitCode::SUCCESS)
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,schemamend=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .compact(),
        )
        .init();
}
