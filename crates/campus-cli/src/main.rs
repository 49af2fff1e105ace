//! `campus-admin` — operator tooling for the identity consistency
//! engine.
//!
//! The audit subcommands are the operational face of the fleet auditor:
//! `audit-orphans` finds (and with `--fix` removes) profiles whose
//! identity reference dangles after an interrupted purge;
//! `audit-unlinked` counts profiles that never had portal access, which
//! is an expected population, never repaired.

use std::process::ExitCode;

use campus_db::repository::{
    SurrealIdentityRepository, SurrealOrganizationRepository, SurrealProfileRepository,
    SurrealStaffRecordRepository, SurrealStudentRecordRepository,
};
use campus_db::{DbConfig, DbManager, run_migrations};
use campus_fleet::{ConsistencyAuditor, FleetAuditReport, FleetConfig};
use clap::{Parser, Subcommand};
use tracing::error;

#[derive(Parser)]
#[command(
    name = "campus-admin",
    about = "Operator tooling for the campus identity consistency engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report orphaned profiles (dangling identity reference) per tenant
    AuditOrphans {
        /// Delete the orphaned profiles and their domain records
        #[arg(long)]
        fix: bool,
    },
    /// Report unlinked profiles (no identity reference) per tenant
    AuditUnlinked,
}

/// Exit status for `audit-orphans`: clean fleets exit 0, anything still
/// orphaned exits 1.
fn orphan_exit_code(remaining_orphans: usize) -> u8 {
    if remaining_orphans > 0 { 1 } else { 0 }
}

fn print_orphan_report(report: &FleetAuditReport) {
    for tenant in &report.tenants {
        println!(
            "{} ({}): {} orphaned profile(s)",
            tenant.schema_name, tenant.name, tenant.orphan_count
        );
        for id in &tenant.orphan_ids {
            println!("  - {id}");
        }
    }
    for schema_name in &report.skipped {
        println!("{schema_name}: SKIPPED (unreachable or timed out)");
    }
    println!("total: {} orphaned profile(s)", report.total_orphans());
}

fn print_unlinked_report(report: &FleetAuditReport) {
    for tenant in &report.tenants {
        println!(
            "{} ({}): {} unlinked profile(s)",
            tenant.schema_name, tenant.name, tenant.unlinked_count
        );
    }
    for schema_name in &report.skipped {
        println!("{schema_name}: SKIPPED (unreachable or timed out)");
    }
    println!("total: {} unlinked profile(s)", report.total_unlinked());
    println!("note: unlinked profiles are expected for people without portal access");
}

async fn run(command: Command) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = DbConfig::from_env();
    let manager = DbManager::connect(&config).await?;
    run_migrations(manager.client()).await?;
    let db = manager.client().clone();

    let directory = SurrealOrganizationRepository::new(db.clone());
    let identity_repo = SurrealIdentityRepository::new(db.clone());
    let profile_repo = SurrealProfileRepository::new(db.clone());
    let staff_repo = SurrealStaffRecordRepository::new(db.clone());
    let student_repo = SurrealStudentRecordRepository::new(db);

    let auditor = ConsistencyAuditor::new(
        &directory,
        &identity_repo,
        &profile_repo,
        &staff_repo,
        &student_repo,
        FleetConfig::default(),
    );

    match command {
        Command::AuditOrphans { fix } => {
            let report = auditor.audit_fleet().await?;
            print_orphan_report(&report);

            if !fix {
                return Ok(ExitCode::from(orphan_exit_code(report.total_orphans())));
            }

            let summary = auditor.repair_fleet(&report).await;
            println!("repaired: {} profile(s) removed", summary.profiles_removed);
            for schema_name in &summary.failed {
                println!("{schema_name}: repair FAILED, orphans left in place");
            }

            // Re-audit so skipped tenants and repair races still count.
            let after = auditor.audit_fleet().await?;
            if after.total_orphans() > 0 {
                println!(
                    "remaining: {} orphaned profile(s) not repaired",
                    after.total_orphans()
                );
            }
            Ok(ExitCode::from(orphan_exit_code(after.total_orphans())))
        }
        Command::AuditUnlinked => {
            let report = auditor.audit_fleet().await?;
            print_unlinked_report(&report);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::from(2)
        }
    }
}
