//! End-to-end tests against a real Docker daemon.
//!
//! Run with `cargo test -p testingx -- --ignored`.

use std::sync::Arc;

use testingx::prelude::*;

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_provision_returns_a_reachable_database() {
    let instance = provision(&Context::background(), PostgresTestParams::default())
        .await
        .expect("provision postgres");

    let (answer,): (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(instance.pool())
        .await
        .unwrap();
    assert_eq!(answer, 1);
    assert!(instance.database_url().starts_with("postgres://postgres:postgres@"));
    assert!(instance.database_url().ends_with("/postgres?sslmode=disable"));

    instance.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_cleanup_twice_reports_not_found() {
    let instance = provision(&Context::background(), PostgresTestParams::default())
        .await
        .expect("provision postgres");

    instance.cleanup().await.unwrap();

    let err = instance.cleanup().await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_migrations_up_then_down_leaves_no_versions() {
    let instance = provision(&Context::background(), PostgresTestParams::default())
        .await
        .expect("provision postgres");

    let migrations = Migrations::new(MigrationParams::embedded(instance.database_url()))
        .await
        .unwrap();

    migrations.up().await.unwrap();
    let status = migrations.status().await.unwrap();
    assert!(status.iter().all(|m| m.applied));

    let (exists,): (bool,) = sqlx::query_as("SELECT to_regclass('public.test_records') IS NOT NULL")
        .fetch_one(instance.pool())
        .await
        .unwrap();
    assert!(exists);

    migrations.down().await.unwrap();
    let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(instance.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    migrations.close().await;
    instance.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_concurrent_provisioning_shares_one_client() {
    let pool = Arc::new(DockerPool::new().await.expect("connect to docker"));

    let instances = futures_util::future::try_join_all((0..3).map(|i| {
        let params = PostgresTestParams::default()
            .with_pool(Arc::clone(&pool))
            .with_database(format!("db{i}"));
        async move { provision(&Context::background(), params).await }
    }))
    .await
    .expect("provision postgres");

    let mut ids: Vec<_> = instances.iter().map(|i| i.resource().id().to_string()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert_eq!(pool.max_wait(), testingx::docker::HANDSHAKE_WAIT);

    for instance in instances {
        instance.cleanup().await.unwrap();
    }
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_debuggable_instance_binds_fixed_port() {
    let instance = provision_debuggable(
        &Context::background(),
        PostgresTestParams::default(),
        Some("55433"),
    )
    .await
    .expect("provision postgres");

    assert!(instance.database_url().contains(":55433/"));
    instance.cleanup().await.unwrap();
}
