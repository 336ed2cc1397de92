use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Connects to the database at `url`
///
/// SQLite connections are limited to a single pooled connection, since
/// each `sqlite::memory:` connection opens its own empty database.
pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url);
    if url.starts_with("sqlite:") {
        options.max_connections(1).min_connections(1);
    }
    options.sqlx_logging(false);
    Database::connect(options).await
}
