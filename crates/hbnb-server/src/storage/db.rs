//! SQLite database layer (embedded, no external dependencies)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use hbnb_core::ports::Objects;
use hbnb_core::{
    Amenity, BaseModel, City, Entity, EntityKind, HbnbError, Place, Result, Review, State,
    Storage, User,
};
use serde_json::Number;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use super::session::SessionId;

type Session = Arc<Mutex<Option<Transaction<'static, Sqlite>>>>;

/// Storage engine backed by SQLite.
///
/// Each [`SessionId`] gets its own transaction: the first `new` or `delete`
/// opens it, `save` commits it and `close` rolls back whatever was not saved.
/// Reads run inside the caller's open transaction so its staged writes are
/// visible before they are saved. Other sessions never see them.
pub struct DbStorage {
    pool: SqlitePool,
    sessions: DashMap<SessionId, Session>,
    reset_on_reload: bool,
}

impl DbStorage {
    pub async fn connect(database_path: &Path, reset_on_reload: bool) -> Result<Self> {
        info!("Opening SQLite database at: {}", database_path.display());

        // Create parent directory if needed
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        Ok(Self::with_pool(pool, reset_on_reload))
    }

    pub fn with_pool(pool: SqlitePool, reset_on_reload: bool) -> Self {
        Self {
            pool,
            sessions: DashMap::new(),
            reset_on_reload,
        }
    }

    /// The caller's session, if it has one
    fn session(&self) -> Option<Session> {
        self.sessions
            .get(&SessionId::current())
            .map(|entry| Arc::clone(entry.value()))
    }

    async fn lock_session(&self) -> OwnedMutexGuard<Option<Transaction<'static, Sqlite>>> {
        let session = Arc::clone(self.sessions.entry(SessionId::current()).or_default().value());
        session.lock_owned().await
    }

    async fn fetch(&self, kind: EntityKind, id: Option<&str>) -> Result<Vec<Entity>> {
        if let Some(session) = self.session() {
            let mut session = session.lock().await;
            if let Some(tx) = session.as_mut() {
                return fetch(&mut **tx, kind, id).await;
            }
        }
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch(&mut conn, kind, id).await
    }

    async fn count_rows(&self, kind: EntityKind) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.collection());
        let query = sqlx::query_scalar::<_, i64>(&sql);

        if let Some(session) = self.session() {
            let mut session = session.lock().await;
            if let Some(tx) = session.as_mut() {
                let count = query.fetch_one(&mut **tx).await.map_err(db_err)?;
                return Ok(usize::try_from(count).unwrap_or_default());
            }
        }
        let count = query.fetch_one(&self.pool).await.map_err(db_err)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn rollback(session: Session) -> Result<()> {
        if let Some(tx) = session.lock().await.take() {
            debug!("Rolling back unsaved session");
            tx.rollback().await.map_err(db_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for DbStorage {
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        Ok(self.fetch(kind, Some(id)).await?.into_iter().next())
    }

    async fn all(&self, kind: Option<EntityKind>) -> Result<Objects> {
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => EntityKind::ALL.to_vec(),
        };

        let mut objects = Objects::new();
        for kind in kinds {
            for entity in self.fetch(kind, None).await? {
                objects.insert(entity.key(), entity);
            }
        }
        Ok(objects)
    }

    async fn new(&self, entity: Entity) -> Result<()> {
        let mut session = self.lock_session().await;
        let tx = match session.take() {
            Some(tx) => tx,
            None => self.pool.begin().await.map_err(db_err)?,
        };
        let tx = session.insert(tx);

        debug!("Registering {}", entity.key());
        upsert(&mut **tx, &entity).await
    }

    async fn save(&self) -> Result<()> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        if let Some(tx) = session.lock().await.take() {
            tx.commit().await.map_err(db_err)?;
            debug!("Session committed");
        }
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        let mut session = self.lock_session().await;
        let tx = match session.take() {
            Some(tx) => tx,
            None => self.pool.begin().await.map_err(db_err)?,
        };
        let tx = session.insert(tx);

        // Owned rows go with it through ON DELETE CASCADE
        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.collection());
        sqlx::query(&sql)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;

        debug!("Deleted {}", kind.key(id));
        Ok(())
    }

    async fn count(&self, kind: Option<EntityKind>) -> Result<usize> {
        match kind {
            Some(kind) => self.count_rows(kind).await,
            None => {
                let mut total = 0;
                for kind in EntityKind::ALL {
                    total += self.count_rows(kind).await?;
                }
                Ok(total)
            }
        }
    }

    async fn close(&self) -> Result<()> {
        match self.sessions.remove(&SessionId::current()) {
            Some((_, session)) => Self::rollback(session).await,
            None => Ok(()),
        }
    }

    async fn reload(&self) -> Result<()> {
        let open: Vec<Session> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        self.sessions.clear();
        for session in open {
            Self::rollback(session).await?;
        }

        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        if self.reset_on_reload {
            info!("Dropping all tables");
            drop_tables(&mut conn).await?;
        }
        run_migrations(&mut conn).await?;

        debug!("Database schema ready");
        Ok(())
    }
}

/// Open the database and create the schema.
pub async fn open(database_path: &Path, reset_on_reload: bool) -> Result<DbStorage> {
    let storage = DbStorage::connect(database_path, reset_on_reload).await?;
    info!("SQLite connection established, running migrations...");
    storage.reload().await?;
    info!("Database initialization complete");
    Ok(storage)
}

fn db_err(e: sqlx::Error) -> HbnbError {
    HbnbError::Database(e.to_string())
}

/// Same message the file engine gives for a taken email.
fn user_err(e: sqlx::Error, email: &str) -> HbnbError {
    match e {
        sqlx::Error::Database(ref db)
            if db.is_unique_violation() && db.message().contains("users.email") =>
        {
            HbnbError::Conflict(format!("Email already exists: {}", email))
        }
        other => db_err(other),
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS states (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cities (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        state_id TEXT NOT NULL REFERENCES states(id) ON DELETE CASCADE,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL,
        first_name TEXT,
        last_name TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS places (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        city_id TEXT NOT NULL REFERENCES cities(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        number_rooms INTEGER,
        number_bathrooms INTEGER,
        max_guest INTEGER,
        price_by_night INTEGER,
        latitude TEXT,
        longitude TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS amenities (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        text TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS place_amenity (
        place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
        amenity_id TEXT NOT NULL REFERENCES amenities(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        PRIMARY KEY (place_id, amenity_id)
    )
    "#,
];

async fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

async fn drop_tables(conn: &mut SqliteConnection) -> Result<()> {
    // Children first so no cascade runs against a missing table
    for table in [
        "place_amenity",
        "reviews",
        "places",
        "amenities",
        "cities",
        "states",
        "users",
    ] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

async fn rows<R>(conn: &mut SqliteConnection, sql: &str, id: Option<&str>) -> Result<Vec<R>>
where
    R: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut query = sqlx::query_as::<_, R>(sql);
    if let Some(id) = id {
        query = query.bind(id.to_string());
    }
    query.fetch_all(&mut *conn).await.map_err(db_err)
}

async fn fetch(conn: &mut SqliteConnection, kind: EntityKind, id: Option<&str>) -> Result<Vec<Entity>> {
    let sql = match id {
        Some(_) => format!("SELECT * FROM {} WHERE id = ?1", kind.collection()),
        None => format!("SELECT * FROM {} ORDER BY created_at", kind.collection()),
    };

    let entities = match kind {
        EntityKind::Amenity => rows::<AmenityRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::Amenity(r.into()))
            .collect(),
        EntityKind::City => rows::<CityRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::City(r.into()))
            .collect(),
        EntityKind::Place => {
            let places = rows::<PlaceRow>(conn, &sql, id).await?;
            let mut links = amenity_links(conn, id).await?;
            places
                .into_iter()
                .map(|r| {
                    let mut place: Place = r.into();
                    place.amenity_ids = links.remove(&place.base.id).unwrap_or_default();
                    Entity::Place(place)
                })
                .collect()
        }
        EntityKind::Review => rows::<ReviewRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::Review(r.into()))
            .collect(),
        EntityKind::State => rows::<StateRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::State(r.into()))
            .collect(),
        EntityKind::User => rows::<UserRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::User(r.into()))
            .collect(),
    };
    Ok(entities)
}

/// Amenity ids per place, in link order
async fn amenity_links(
    conn: &mut SqliteConnection,
    place_id: Option<&str>,
) -> Result<HashMap<String, Vec<String>>> {
    let sql = match place_id {
        Some(_) => "SELECT place_id, amenity_id FROM place_amenity WHERE place_id = ?1 ORDER BY position",
        None => "SELECT place_id, amenity_id FROM place_amenity ORDER BY place_id, position",
    };

    let mut links: HashMap<String, Vec<String>> = HashMap::new();
    for (place_id, amenity_id) in rows::<(String, String)>(conn, sql, place_id).await? {
        links.entry(place_id).or_default().push(amenity_id);
    }
    Ok(links)
}

async fn upsert(conn: &mut SqliteConnection, entity: &Entity) -> Result<()> {
    match entity {
        Entity::Amenity(amenity) => {
            sqlx::query(
                r#"
                INSERT INTO amenities (id, created_at, updated_at, name)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    name = excluded.name
                "#,
            )
            .bind(&amenity.base.id)
            .bind(amenity.base.created_at)
            .bind(amenity.base.updated_at)
            .bind(&amenity.name)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
        }
        Entity::City(city) => {
            sqlx::query(
                r#"
                INSERT INTO cities (id, created_at, updated_at, state_id, name)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    state_id = excluded.state_id,
                    name = excluded.name
                "#,
            )
            .bind(&city.base.id)
            .bind(city.base.created_at)
            .bind(city.base.updated_at)
            .bind(&city.state_id)
            .bind(&city.name)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
        }
        Entity::Place(place) => {
            sqlx::query(
                r#"
                INSERT INTO places (
                    id, created_at, updated_at, city_id, user_id, name, description,
                    number_rooms, number_bathrooms, max_guest, price_by_night,
                    latitude, longitude
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    city_id = excluded.city_id,
                    user_id = excluded.user_id,
                    name = excluded.name,
                    description = excluded.description,
                    number_rooms = excluded.number_rooms,
                    number_bathrooms = excluded.number_bathrooms,
                    max_guest = excluded.max_guest,
                    price_by_night = excluded.price_by_night,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude
                "#,
            )
            .bind(&place.base.id)
            .bind(place.base.created_at)
            .bind(place.base.updated_at)
            .bind(&place.city_id)
            .bind(&place.user_id)
            .bind(&place.name)
            .bind(&place.description)
            .bind(place.number_rooms)
            .bind(place.number_bathrooms)
            .bind(place.max_guest)
            .bind(place.price_by_night)
            .bind(place.latitude.as_ref().map(Number::to_string))
            .bind(place.longitude.as_ref().map(Number::to_string))
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;

            sqlx::query("DELETE FROM place_amenity WHERE place_id = ?1")
                .bind(&place.base.id)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;

            for (position, amenity_id) in place.amenity_ids.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO place_amenity (place_id, amenity_id, position) VALUES (?1, ?2, ?3)",
                )
                .bind(&place.base.id)
                .bind(amenity_id)
                .bind(i64::try_from(position).unwrap_or(i64::MAX))
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            }
        }
        Entity::Review(review) => {
            sqlx::query(
                r#"
                INSERT INTO reviews (id, created_at, updated_at, place_id, user_id, text)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    place_id = excluded.place_id,
                    user_id = excluded.user_id,
                    text = excluded.text
                "#,
            )
            .bind(&review.base.id)
            .bind(review.base.created_at)
            .bind(review.base.updated_at)
            .bind(&review.place_id)
            .bind(&review.user_id)
            .bind(&review.text)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
        }
        Entity::State(state) => {
            sqlx::query(
                r#"
                INSERT INTO states (id, created_at, updated_at, name)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    name = excluded.name
                "#,
            )
            .bind(&state.base.id)
            .bind(state.base.created_at)
            .bind(state.base.updated_at)
            .bind(&state.name)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
        }
        Entity::User(user) => {
            sqlx::query(
                r#"
                INSERT INTO users (id, created_at, updated_at, email, password, first_name, last_name)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    email = excluded.email,
                    password = excluded.password,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name
                "#,
            )
            .bind(&user.base.id)
            .bind(user.base.created_at)
            .bind(user.base.updated_at)
            .bind(&user.email)
            .bind(&user.password)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .execute(&mut *conn)
            .await
            .map_err(|e| user_err(e, &user.email))?;
        }
    }
    Ok(())
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct StateRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    name: String,
}

impl From<StateRow> for State {
    fn from(r: StateRow) -> Self {
        State {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CityRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state_id: String,
    name: String,
}

impl From<CityRow> for City {
    fn from(r: CityRow) -> Self {
        City {
            base: base(r.id, r.created_at, r.updated_at),
            state_id: r.state_id,
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            base: base(r.id, r.created_at, r.updated_at),
            email: r.email,
            password: r.password,
            first_name: r.first_name,
            last_name: r.last_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlaceRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    city_id: String,
    user_id: String,
    name: String,
    description: Option<String>,
    number_rooms: Option<i64>,
    number_bathrooms: Option<i64>,
    max_guest: Option<i64>,
    price_by_night: Option<i64>,
    // JSON number text, so `-122` stays an integer
    latitude: Option<String>,
    longitude: Option<String>,
}

impl From<PlaceRow> for Place {
    fn from(r: PlaceRow) -> Self {
        Place {
            base: base(r.id, r.created_at, r.updated_at),
            city_id: r.city_id,
            user_id: r.user_id,
            name: r.name,
            description: r.description,
            number_rooms: r.number_rooms,
            number_bathrooms: r.number_bathrooms,
            max_guest: r.max_guest,
            price_by_night: r.price_by_night,
            latitude: r.latitude.as_deref().and_then(number),
            longitude: r.longitude.as_deref().and_then(number),
            amenity_ids: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct AmenityRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    name: String,
}

impl From<AmenityRow> for Amenity {
    fn from(r: AmenityRow) -> Self {
        Amenity {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    place_id: String,
    user_id: String,
    text: String,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Review {
            base: base(r.id, r.created_at, r.updated_at),
            place_id: r.place_id,
            user_id: r.user_id,
            text: r.text,
        }
    }
}

fn number(text: &str) -> Option<Number> {
    serde_json::from_str(text).ok()
}

fn base(id: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> BaseModel {
    BaseModel {
        id,
        created_at,
        updated_at,
    }
}
