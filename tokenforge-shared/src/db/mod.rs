/// Database access
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a `SELECT 1` health check
/// - `migrations`: Embedded schema migrations, run at server start
///
/// Models and their queries live in [`crate::models`].
///
/// # Example
///
/// ```no_run
/// use tokenforge_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
