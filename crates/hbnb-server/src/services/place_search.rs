//! Place search across states, cities and amenities

use hbnb_core::{Amenity, City, InvalidField, Place, Result, State, Storage, StorageExt};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Search criteria; every list holds ids and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceFilter {
    pub states: Vec<String>,
    pub cities: Vec<String>,
    pub amenities: Vec<String>,
}

impl PlaceFilter {
    /// Read the filter from a search body. Absent or `null` lists are empty.
    pub fn from_payload(payload: &Map<String, Value>) -> std::result::Result<Self, InvalidField> {
        Ok(Self {
            states: ids(payload, "states")?,
            cities: ids(payload, "cities")?,
            amenities: ids(payload, "amenities")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.cities.is_empty() && self.amenities.is_empty()
    }
}

fn ids(payload: &Map<String, Value>, field: &str) -> std::result::Result<Vec<String>, InvalidField> {
    let invalid = || InvalidField(field.to_string());
    match payload.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

/// Places matching `filter`.
///
/// Places come from the cities of the listed states, then from the listed
/// cities, each place once in first-seen order. With no state or city listed
/// every place is a candidate. Candidates must carry every listed amenity that
/// exists. Ids that resolve to nothing are skipped.
pub async fn search(storage: &dyn Storage, filter: &PlaceFilter) -> Result<Vec<Place>> {
    let places = storage.all_of::<Place>().await?;
    if filter.is_empty() {
        return Ok(places);
    }

    let mut candidates = if filter.states.is_empty() && filter.cities.is_empty() {
        places
    } else {
        let city_ids = cities_in_scope(storage, filter).await?;
        let mut seen = HashSet::new();
        let mut picked = Vec::new();
        for city_id in &city_ids {
            for place in places.iter().filter(|p| &p.city_id == city_id) {
                if seen.insert(place.base.id.clone()) {
                    picked.push(place.clone());
                }
            }
        }
        picked
    };

    let mut amenity_ids = Vec::new();
    for amenity_id in &filter.amenities {
        if storage.get_as::<Amenity>(amenity_id).await?.is_some() {
            amenity_ids.push(amenity_id.as_str());
        }
    }
    if !amenity_ids.is_empty() {
        candidates.retain(|place| amenity_ids.iter().all(|id| place.has_amenity(id)));
    }

    debug!("Place search matched {} places", candidates.len());
    Ok(candidates)
}

/// Cities of the listed states followed by the listed cities that exist
async fn cities_in_scope(storage: &dyn Storage, filter: &PlaceFilter) -> Result<Vec<String>> {
    let mut city_ids = Vec::new();
    for state_id in &filter.states {
        if storage.get_as::<State>(state_id).await?.is_none() {
            continue;
        }
        for city in storage.cities_of_state(state_id).await? {
            city_ids.push(city.base.id);
        }
    }
    for city_id in &filter.cities {
        if storage.get_as::<City>(city_id).await?.is_some() {
            city_ids.push(city_id.clone());
        }
    }
    Ok(city_ids)
}
