//! SQLite connection pool and schema bootstrap.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const CREATE_CATALOG_PRODUCTS: &str = "CREATE TABLE IF NOT EXISTS catalog_products (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    identifier TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    embedding BLOB,
    embedding_model TEXT
)";

const CREATE_LINE_ITEM_MATCHES: &str = "CREATE TABLE IF NOT EXISTS line_item_matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    batch_reference TEXT NOT NULL,
    line_number INTEGER NOT NULL,
    product_code TEXT,
    product_name TEXT,
    match_method TEXT NOT NULL,
    match_score REAL NOT NULL,
    diagnostic TEXT,
    created_at TIMESTAMP NOT NULL
)";

/// Build an r2d2 pool for the SQLite database at `database_url`.
pub fn establish_connection_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder().build(manager)
}

/// Create the catalog and match tables when they do not exist yet.
pub fn ensure_schema(conn: &mut SqliteConnection) -> QueryResult<()> {
    diesel::sql_query(CREATE_CATALOG_PRODUCTS).execute(conn)?;
    diesel::sql_query(CREATE_LINE_ITEM_MATCHES).execute(conn)?;
    Ok(())
}
