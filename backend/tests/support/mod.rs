//! Shared embedded PostgreSQL helpers for integration tests.
//!
//! The embedded cluster defaults to installing under `/var/tmp`, which
//! sandboxed environments block; when `PG_RUNTIME_DIR`/`PG_DATA_DIR` are
//! unset, both are pointed at workspace-backed directories before the
//! shared cluster boots. Schema setup runs the embedded Diesel migrations
//! so test schemas cannot drift from the committed ones.

use std::path::PathBuf;
use std::sync::OnceLock;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};

/// Embedded migrations from the backend/migrations directory.
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static CLUSTER_ENV: OnceLock<Result<(), String>> = OnceLock::new();

/// Returns true when `SKIP_TEST_CLUSTER` is set to a truthy value.
///
/// Truthy values: "1", "true", "yes" (case-insensitive).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Handles embedded cluster setup failures consistently across suites.
///
/// When `SKIP_TEST_CLUSTER` is truthy, prints a skip marker and returns
/// `None`. Otherwise, panics so CI breakage is not masked.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

fn pg_embed_target_dir() -> PathBuf {
    if let Some(target_dir) = std::env::var_os("CARGO_TARGET_DIR") {
        return PathBuf::from(target_dir).join("pg-embed");
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("target")
        .join("pg-embed")
}

fn init_cluster_env() -> Result<(), String> {
    if std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none() {
        let base = pg_embed_target_dir().join(format!("cluster-{}", std::process::id()));
        let runtime_dir = base.join("install");
        let data_dir = base.join("data");
        std::fs::create_dir_all(&runtime_dir).map_err(|err| err.to_string())?;
        std::fs::create_dir_all(&data_dir).map_err(|err| err.to_string())?;

        // SAFETY: runs at most once per process via the OnceLock, before
        // the cluster library spawns any threads.
        unsafe {
            std::env::set_var("PG_RUNTIME_DIR", &runtime_dir);
            std::env::set_var("PG_DATA_DIR", &data_dir);
        }
    }

    if std::env::var_os("PG_PASSWORD").is_none() {
        // A stable password keeps reboots of an existing data directory
        // from failing authentication with a freshly generated one.
        // SAFETY: same single-initialisation guarantee as above.
        unsafe {
            std::env::set_var("PG_PASSWORD", "banksync_embedded_test");
        }
    }

    Ok(())
}

/// Returns the process-wide shared cluster handle, booting it on first use.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    CLUSTER_ENV.get_or_init(init_cluster_env).clone()?;
    pg_embedded_setup_unpriv::test_support::shared_cluster_handle()
        .map_err(|err| format!("{err:?}"))
}

/// Provisions a fresh migrated database on the shared cluster.
pub fn provision_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let name = format!("test_{}", uuid::Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name)
        .map_err(|err| format!("{err:?}"))?;
    migrate_schema(database.url())?;
    Ok(database)
}

/// Runs all pending Diesel migrations against the test database.
fn migrate_schema(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| err.to_string())?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("migration: {err}"))?;
    Ok(())
}
