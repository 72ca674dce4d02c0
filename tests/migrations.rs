use kiosk_sync::sync::database::MIGRATOR;
use kiosk_sync::test_support::{TestCluster, TestDatabaseError};

#[tokio::test]
async fn migrations_apply_and_revert_cleanly() {
    let cluster = match TestCluster::start().await {
        Ok(cluster) => cluster,
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping migration revert test: no container runtime ({err})");
            return;
        }
        Err(err) => panic!("failed to start test cluster: {err:?}"),
    };

    let database = cluster.create_database("migrations").await.expect("database created");
    let pool = cluster.connect(&database).await.expect("connected");

    MIGRATOR.run(&pool).await.expect("migrations run");
    MIGRATOR.undo(&pool, 0).await.expect("migrations revert");

    let scan_tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public' AND table_name = 'ods_scan_data'",
    )
    .fetch_one(&pool)
    .await
    .expect("lookup succeeded");

    assert_eq!(scan_tables, 0, "ods_scan_data should be dropped after revert");

    MIGRATOR.run(&pool).await.expect("migrations rerun");

    let scan_tables_after: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public' AND table_name = 'ods_scan_data'",
    )
    .fetch_one(&pool)
    .await
    .expect("lookup succeeded");

    assert_eq!(scan_tables_after, 1);

    pool.close().await;
    cluster.close().await;
}
