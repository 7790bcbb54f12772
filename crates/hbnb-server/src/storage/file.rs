//! File-backed storage: an in-memory object map serialized to one JSON file

use async_trait::async_trait;
use dashmap::DashMap;
use hbnb_core::ports::Objects;
use hbnb_core::{Entity, EntityKind, HbnbError, Result, Storage};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Objects live in a process-wide map keyed `"<Class>.<id>"`.
///
/// `new` and `delete` change the map immediately; `save` writes the whole map
/// to the file. `reload` (and `close`) merge the file back into the map, so a
/// deletion that was never saved is undone by the next `close`.
pub struct FileStorage {
    path: PathBuf,
    objects: DashMap<String, Entity>,
    /// One save at a time, from snapshot to rename
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            objects: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn snapshot(&self, kind: Option<EntityKind>) -> Objects {
        self.objects
            .iter()
            .filter(|entry| kind.map_or(true, |k| entry.value().kind() == k))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn check_unique_email(&self, entity: &Entity) -> Result<()> {
        let Entity::User(user) = entity else {
            return Ok(());
        };
        let taken = self.objects.iter().any(|entry| match entry.value() {
            Entity::User(other) => other.email == user.email && other.base.id != user.base.id,
            _ => false,
        });
        if taken {
            return Err(HbnbError::Conflict(format!(
                "Email already exists: {}",
                user.email
            )));
        }
        Ok(())
    }

    /// Records owned by `(kind, id)`, removed along with it.
    fn dependents(&self, kind: EntityKind, id: &str) -> Vec<(EntityKind, String)> {
        self.objects
            .iter()
            .filter_map(|entry| {
                let owned = match (kind, entry.value()) {
                    (EntityKind::State, Entity::City(city)) => city.state_id == id,
                    (EntityKind::City, Entity::Place(place)) => place.city_id == id,
                    (EntityKind::User, Entity::Place(place)) => place.user_id == id,
                    (EntityKind::User, Entity::Review(review)) => review.user_id == id,
                    (EntityKind::Place, Entity::Review(review)) => review.place_id == id,
                    _ => false,
                };
                owned.then(|| (entry.value().kind(), entry.value().id().to_string()))
            })
            .collect()
    }

    fn unlink_amenity(&self, amenity_id: &str) {
        for mut entry in self.objects.iter_mut() {
            if let Entity::Place(place) = entry.value_mut() {
                place.unlink_amenity(amenity_id);
            }
        }
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        Ok(self
            .objects
            .get(&kind.key(id))
            .map(|entry| entry.value().clone()))
    }

    async fn all(&self, kind: Option<EntityKind>) -> Result<Objects> {
        Ok(self.snapshot(kind))
    }

    async fn new(&self, entity: Entity) -> Result<()> {
        self.check_unique_email(&entity)?;
        debug!("Registering {}", entity.key());
        self.objects.insert(entity.key(), entity);
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let data = serde_json::to_vec(&self.snapshot(None))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Write beside the target, then swap it in
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Saved {} objects to {}", self.objects.len(), self.path.display());
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        let mut pending = vec![(kind, id.to_string())];
        while let Some((kind, id)) = pending.pop() {
            if self.objects.remove(&kind.key(&id)).is_none() {
                continue;
            }
            debug!("Deleted {}", kind.key(&id));
            if kind == EntityKind::Amenity {
                self.unlink_amenity(&id);
            }
            pending.extend(self.dependents(kind, &id));
        }
        Ok(())
    }

    async fn count(&self, kind: Option<EntityKind>) -> Result<usize> {
        Ok(match kind {
            None => self.objects.len(),
            Some(kind) => self
                .objects
                .iter()
                .filter(|entry| entry.value().kind() == kind)
                .count(),
        })
    }

    async fn close(&self) -> Result<()> {
        self.reload().await
    }

    async fn reload(&self) -> Result<()> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let objects: Objects = serde_json::from_slice(&data)?;
        let loaded = objects.len();
        for (key, entity) in objects {
            self.objects.insert(key, entity);
        }

        debug!("Reloaded {} objects from {}", loaded, self.path.display());
        Ok(())
    }
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("path", &self.path)
            .field("objects", &self.objects.len())
            .finish()
    }
}

/// Open a file store at `path`, loading any objects already saved there.
pub async fn open(path: &Path) -> Result<FileStorage> {
    info!("Opening file storage at: {}", path.display());
    let storage = FileStorage::new(path);
    storage.reload().await?;
    info!("Loaded {} objects", storage.objects.len());
    Ok(storage)
}
