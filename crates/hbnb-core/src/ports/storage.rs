//! Storage traits for persistence

use crate::Result;
use async_trait::async_trait;
use hbnb_types::{Amenity, City, Entity, EntityKind, Model, Place, Review};
use std::collections::BTreeMap;

/// Records keyed by `"<Class>.<id>"`
pub type Objects = BTreeMap<String, Entity>;

/// Uniform lifecycle interface over a storage engine.
///
/// Writes made with [`Storage::new`] and [`Storage::delete`] are staged and
/// become durable on [`Storage::save`]. Staged writes are visible to reads
/// made through the same engine before they are saved.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Look up one record by kind and id.
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>>;

    /// All records, or all records of one kind.
    async fn all(&self, kind: Option<EntityKind>) -> Result<Objects>;

    /// Register a record, replacing any record with the same key.
    async fn new(&self, entity: Entity) -> Result<()>;

    /// Flush staged changes to durable storage.
    async fn save(&self) -> Result<()>;

    /// Remove a record together with the records it owns.
    async fn delete(&self, kind: EntityKind, id: &str) -> Result<()>;

    /// Number of records of one kind, or of every kind combined.
    async fn count(&self, kind: Option<EntityKind>) -> Result<usize>;

    /// Release per-request resources. Called when a request ends.
    async fn close(&self) -> Result<()>;

    /// (Re)initialize the underlying session or data.
    async fn reload(&self) -> Result<()>;
}

/// Typed and relationship accessors available on every [`Storage`]
#[async_trait]
pub trait StorageExt: Storage {
    async fn get_as<T: Model>(&self, id: &str) -> Result<Option<T>> {
        Ok(self
            .get(T::KIND, id)
            .await?
            .and_then(|entity| T::try_from(entity).ok()))
    }

    /// Every record of type `T`, oldest first.
    async fn all_of<T: Model>(&self) -> Result<Vec<T>> {
        let mut models: Vec<T> = self
            .all(Some(T::KIND))
            .await?
            .into_values()
            .filter_map(|entity| T::try_from(entity).ok())
            .collect();
        models.sort_by(|a, b| {
            a.base()
                .created_at
                .cmp(&b.base().created_at)
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(models)
    }

    async fn put<T: Model>(&self, model: T) -> Result<()> {
        self.new(model.into()).await
    }

    async fn cities_of_state(&self, state_id: &str) -> Result<Vec<City>> {
        let cities = self.all_of::<City>().await?;
        Ok(cities.into_iter().filter(|c| c.state_id == state_id).collect())
    }

    async fn places_of_city(&self, city_id: &str) -> Result<Vec<Place>> {
        let places = self.all_of::<Place>().await?;
        Ok(places.into_iter().filter(|p| p.city_id == city_id).collect())
    }

    async fn reviews_of_place(&self, place_id: &str) -> Result<Vec<Review>> {
        let reviews = self.all_of::<Review>().await?;
        Ok(reviews.into_iter().filter(|r| r.place_id == place_id).collect())
    }

    /// Amenities linked to `place`; dangling links are skipped.
    async fn amenities_of_place(&self, place: &Place) -> Result<Vec<Amenity>> {
        let mut amenities = Vec::with_capacity(place.amenity_ids.len());
        for amenity_id in &place.amenity_ids {
            if let Some(amenity) = self.get_as::<Amenity>(amenity_id).await? {
                amenities.push(amenity);
            }
        }
        Ok(amenities)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}
