use std::time::Duration;

use anyhow::Result;
use diesel::{
    Connection, PgConnection,
    connection::CacheSize,
    r2d2::{ConnectionManager, CustomizeConnection, Error as R2d2Error, Pool},
};

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Poolers in transaction mode cannot keep server-side prepared statements alive.
#[derive(Debug, Default)]
struct DisablePreparedStatements;

impl CustomizeConnection<PgConnection, R2d2Error> for DisablePreparedStatements {
    fn on_acquire(&self, conn: &mut PgConnection) -> std::result::Result<(), R2d2Error> {
        conn.set_prepared_statement_cache_size(CacheSize::Disabled);
        Ok(())
    }
}

pub type PgPoolSquad = Pool<ConnectionManager<PgConnection>>;

/// Builds the pool lazily: no connection is opened until the first request needs one,
/// so the server can start while the database is still coming up.
pub fn establish_connection(database_url: &str) -> Result<PgPoolSquad> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .connection_timeout(CONNECTION_TIMEOUT)
        .connection_customizer(Box::new(DisablePreparedStatements))
        .build_unchecked(manager);
    Ok(pool)
}
