/// Connection tests
///
/// Validation tests run anywhere. The live tests require Oracle Instant
/// Client and a reachable database; they are ignored by default and read
/// their configuration from environment variables (or a .env file), e.g.:
///
///   HOST=localhost PORT=1521 SERVICE_NAME=XEPDB1 USERNAME=scott \
///   PASSWORD=tiger cargo test --test connection_tests -- --ignored

use chrono::Utc;
use oracle_node::{
    executor, CacheKey, ClientPathType, DatabaseType, Error, QueryOptions, SourceOptions,
};
use std::env;

fn load_live_source() -> Option<SourceOptions> {
    dotenv::dotenv().ok();
    Some(SourceOptions {
        host: env::var("HOST").ok()?,
        port: env::var("PORT").ok()?.parse().ok()?,
        username: env::var("USERNAME").ok()?,
        password: env::var("PASSWORD").ok()?,
        database: env::var("SERVICE_NAME").ok()?,
        database_type: DatabaseType::ServiceName,
        ssl_enabled: false,
        client_path_type: ClientPathType::Default,
        path: None,
    })
}

fn valid_source() -> SourceOptions {
    SourceOptions {
        host: "localhost".to_string(),
        port: 1521,
        username: "scott".to_string(),
        password: "tiger".to_string(),
        database: "ORCL".to_string(),
        database_type: DatabaseType::ServiceName,
        ssl_enabled: false,
        client_path_type: ClientPathType::Default,
        path: None,
    }
}

#[test]
fn test_connection_rejects_empty_host() {
    let mut source = valid_source();
    source.host = String::new();

    let result = executor::test_connection(&source);
    match result {
        Err(Error::InvalidOptions(msg)) => assert!(msg.contains("host")),
        other => panic!("expected invalid options, got {:?}", other.err()),
    }
}

#[test]
fn test_connection_rejects_missing_custom_path() {
    let mut source = valid_source();
    source.client_path_type = ClientPathType::Custom;
    source.path = None;

    let result = executor::test_connection(&source);
    assert!(matches!(result, Err(Error::InvalidOptions(_))));
}

#[test]
fn test_run_rejects_invalid_source_before_touching_database() {
    let mut source = valid_source();
    source.port = 0;
    let options = QueryOptions::Raw {
        query: "SELECT 1 FROM dual".to_string(),
    };
    let key = CacheKey {
        data_source_id: "invalid-source".to_string(),
        updated_at: Utc::now(),
    };

    let result = executor::run(&source, &options, &key);
    assert!(matches!(result, Err(Error::InvalidOptions(_))));
}

#[test]
#[ignore] // requires Oracle Instant Client and a running database
fn test_probe_against_real_database() {
    let source = match load_live_source() {
        Some(s) => s,
        None => {
            println!("skipping: no database configuration in environment");
            return;
        }
    };

    executor::test_connection(&source).expect("connectivity probe failed");
}

#[test]
#[ignore] // requires Oracle Instant Client and a running database
fn test_raw_query_against_real_database() {
    let source = match load_live_source() {
        Some(s) => s,
        None => {
            println!("skipping: no database configuration in environment");
            return;
        }
    };

    let options = QueryOptions::Raw {
        query: "SELECT 1 AS N FROM dual".to_string(),
    };
    let key = CacheKey {
        data_source_id: "live-test".to_string(),
        updated_at: Utc::now(),
    };

    let rows = executor::run(&source, &options, &key).expect("query failed");
    assert_eq!(rows.len(), 1);

    // A second run with the same key reuses the cached pool.
    let rows = executor::run(&source, &options, &key).expect("cached query failed");
    assert_eq!(rows.len(), 1);
}
