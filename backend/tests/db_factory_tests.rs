//! Tests for db::factory module - repository creation and configuration.

use std::io::Write;
use std::str::FromStr;

use rss_feeds::db::factory::{RepositoryFactory, RepositoryType};
use rss_feeds::db::{FeedRepository, RepositoryConfig};
use rss_feeds::models::Feed;
use rss_feeds::ErrorKind;

#[test]
fn test_repository_type_from_str_postgres() {
    let rt = RepositoryType::from_str("postgres").unwrap();
    assert_eq!(rt, RepositoryType::Postgres);

    let rt = RepositoryType::from_str("POSTGRES").unwrap();
    assert_eq!(rt, RepositoryType::Postgres);

    let rt = RepositoryType::from_str("pg").unwrap();
    assert_eq!(rt, RepositoryType::Postgres);
}

#[test]
fn test_repository_type_from_str_invalid() {
    let result = RepositoryType::from_str("invalid");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Unknown repository type"));
}

#[cfg(feature = "local-repo")]
#[tokio::test]
async fn test_create_local_via_factory() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .unwrap();

    let mut feed = Feed::new("t", "d", "https://u.example/feed", "https://u.example");
    repo.create(&mut feed).await.unwrap();
    assert_eq!(repo.get(feed.id).await.unwrap().title, "t");
}

#[cfg(feature = "postgres-repo")]
#[tokio::test]
async fn test_create_postgres_without_config_fails() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    assert!(err.to_string().contains("requires PostgresConfig"));
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_create_postgres_without_feature_fails() {
    let config = rss_feeds::db::PostgresConfig::with_url("postgres://localhost/rss");
    let err = RepositoryFactory::create(RepositoryType::Postgres, Some(&config))
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("feature not enabled"));
}

#[cfg(feature = "local-repo")]
#[tokio::test]
async fn test_from_config_file_local() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"local\"").unwrap();

    let repo = RepositoryFactory::from_config_file(file.path()).await.unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_from_config_file_missing() {
    let err = RepositoryFactory::from_config_file("/nonexistent/repository.toml")
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);
}

#[tokio::test]
async fn test_from_repository_config_unknown_type() {
    let config = RepositoryConfig::from_toml("[repository]\ntype = \"sqlite\"\n").unwrap();
    let err = RepositoryFactory::from_repository_config(&config)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("Invalid repository type"));
}
