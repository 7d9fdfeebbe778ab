use super::{DatabaseProbe, DatabaseSettings};
use crate::config::EnvDir;
use crate::constants::queries;
use crate::errors::DatabaseError;
use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, warn};

/// Opens a new connection for every check and closes it right after.
/// A pooled connection could outlive a failover and report a stale role.
pub struct PostgresProbe {
    settings: DatabaseSettings,
    envdir: Option<EnvDir>,
}

impl PostgresProbe {
    pub fn new(settings: DatabaseSettings, envdir: Option<EnvDir>) -> Self {
        Self { settings, envdir }
    }

    async fn connect(&self) -> Result<PgConnection, DatabaseError> {
        if let Some(envdir) = &self.envdir {
            if let Err(e) = envdir.refresh().await {
                warn!("Could not refresh envdir before connecting: {}", e);
            }
        }

        let params = self
            .settings
            .resolve_from_env()
            .map_err(|e| DatabaseError::ConnectionFailed {
                host: self.settings.host.clone().unwrap_or_default(),
                reason: e.to_string(),
            })?;

        debug!("Connecting to PostgreSQL at {}", params.endpoint());

        let options = params.connect_options();
        options
            .connect()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                host: params.endpoint(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl DatabaseProbe for PostgresProbe {
    async fn ping(&self) -> Result<(), DatabaseError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(queries::LIVENESS).execute(&mut conn).await;
        close(conn).await;

        result.map(|_| ()).map_err(|e| DatabaseError::QueryFailed {
            query: queries::LIVENESS.to_string(),
            reason: e.to_string(),
        })
    }

    async fn is_primary(&self) -> Result<bool, DatabaseError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query_scalar::<_, bool>(queries::IS_PRIMARY)
            .fetch_one(&mut conn)
            .await;
        close(conn).await;

        result.map_err(|e| DatabaseError::QueryFailed {
            query: queries::IS_PRIMARY.to_string(),
            reason: e.to_string(),
        })
    }
}

async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        debug!("Error while closing PostgreSQL connection: {}", e);
    }
}
