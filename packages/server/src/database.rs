use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    // Case-insensitive team-name uniqueness is enforced by the database,
    // not just the pre-insert check, so racing registrations cannot both
    // land. Functional indexes are outside the entity schema sync.
    db.execute_unprepared(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_team_hackathon_name \
         ON team (hackathon_id, lower(team_name))",
    )
    .await?;

    Ok(db)
}
