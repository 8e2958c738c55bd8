use anyhow::Context;
use postgresql_embedded::PostgreSQL;
use sea_orm::{ConnectOptions, ConnectionTrait, DatabaseConnection, Statement};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tempfile::TempDir;
use vigil_migration::{Migrator, MigratorTrait};

#[derive(Debug)]
enum DbStrategy {
    External,
    Managed(Arc<(PostgreSQL, TempDir)>),
}

/// Shared handle to the cache database. Connecting applies pending
/// migrations, so a `Database` is always at the current schema.
#[derive(Clone, Debug)]
pub struct Database {
    db: DatabaseConnection,
    db_strategy: Arc<DbStrategy>,
}

impl Database {
    async fn connect(
        username: &str,
        password: &str,
        host: &str,
        port: u16,
        db_name: &str,
        db_strategy: DbStrategy,
    ) -> Result<Self, anyhow::Error> {
        let url = format!("postgres://{username}:{password}@{host}:{port}/{db_name}");
        log::info!("connecting to {host}:{port}/{db_name}");

        let mut opt = ConnectOptions::new(url);
        opt.sqlx_logging_level(log::LevelFilter::Trace);

        let db = sea_orm::Database::connect(opt).await?;

        log::debug!("applying migrations");
        Migrator::up(&db, None).await?;
        log::debug!("applied migrations");

        Ok(Self {
            db,
            db_strategy: Arc::new(db_strategy),
        })
    }

    pub async fn new(database: &crate::config::Database) -> Result<Self, anyhow::Error> {
        Self::connect(
            &database.username,
            &database.password,
            &database.host,
            database.port,
            &database.name,
            DbStrategy::External,
        )
        .await
    }

    /// Drop and re-create the database, then connect. First-run setup only.
    pub async fn bootstrap(database: &crate::config::Database) -> Result<Self, anyhow::Error> {
        log::warn!("bootstrapping database '{}'", database.name);
        Self::recreate(
            &database.username,
            &database.password,
            &database.host,
            database.port,
            &database.name,
            DbStrategy::External,
        )
        .await
    }

    /// A throwaway database on an embedded PostgreSQL instance. The server
    /// process and its data directory live as long as the returned handle.
    pub async fn for_test(name: &str) -> Result<Self, anyhow::Error> {
        use postgresql_embedded::Settings;

        let tempdir = tempfile::tempdir()?;
        let installation_dir = tempdir.path().to_path_buf();
        let settings = Settings {
            username: "postgres".to_string(),
            password: "vigil".to_string(),
            temporary: true,
            installation_dir,
            ..Default::default()
        };

        let mut postgresql = PostgreSQL::new(settings);
        postgresql.setup().await?;
        postgresql.start().await?;

        let port = postgresql.settings().port;

        Self::recreate(
            "postgres",
            "vigil",
            "localhost",
            port,
            name,
            DbStrategy::Managed(Arc::new((postgresql, tempdir))),
        )
        .await
    }

    async fn recreate(
        username: &str,
        password: &str,
        host: &str,
        port: u16,
        db_name: &str,
        db_strategy: DbStrategy,
    ) -> Result<Self, anyhow::Error> {
        let url = format!("postgres://{username}:{password}@{host}:{port}/postgres");
        let db = sea_orm::Database::connect(url).await?;

        db.execute(Statement::from_string(
            db.get_database_backend(),
            format!("DROP DATABASE IF EXISTS \"{db_name}\";"),
        ))
        .await?;

        db.execute(Statement::from_string(
            db.get_database_backend(),
            format!("CREATE DATABASE \"{db_name}\";"),
        ))
        .await?;

        db.close().await?;

        Self::connect(username, password, host, port, db_name, db_strategy).await
    }

    pub async fn close(self) -> anyhow::Result<()> {
        Ok(self.db.close().await?)
    }

    /// Ping the database.
    ///
    /// Intended to be used for health checks.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.db
            .ping()
            .await
            .context("failed to ping the database")?;
        Ok(())
    }
}

impl Deref for Database {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl DerefMut for Database {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.db
    }
}
