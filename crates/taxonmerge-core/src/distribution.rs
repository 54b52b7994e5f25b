//! Locations and distributions.

use crate::element::{LocationId, ProviderId};
use crate::error::{Result, TaxonomyError};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use taxonmerge_model::OccurrenceStatus;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationRecord {
    #[serde(rename = "locationID")]
    pub location_id: String,
    #[serde(rename = "parentLocationID")]
    pub parent_location_id: Option<String>,
    pub locality: String,
    pub geography_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Location {
    pub location_id: String,
    pub locality: String,
    pub geography_type: Option<String>,
    parent: Option<LocationId>,
}

impl Location {
    pub fn parent(&self) -> Option<LocationId> {
        self.parent
    }
}

/// Locations with their containment tree.
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    locations: Vec<Location>,
    by_id: AHashMap<String, LocationId>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a batch of locations. Parents may appear in any order but must
    /// be known once the whole batch is in.
    pub fn load(&mut self, records: &[LocationRecord]) -> Result<()> {
        let start = self.locations.len();
        for r in records {
            let id = LocationId::from_index(self.locations.len());
            self.by_id.insert(r.location_id.clone(), id);
            self.locations.push(Location {
                location_id: r.location_id.clone(),
                locality: r.locality.clone(),
                geography_type: r.geography_type.clone(),
                parent: None,
            });
        }
        for (offset, r) in records.iter().enumerate() {
            if let Some(parent) = &r.parent_location_id {
                let pid = self
                    .lookup(parent)
                    .ok_or_else(|| TaxonomyError::UnknownLocation(parent.clone()))?;
                self.locations[start + offset].parent = Some(pid);
            }
        }
        tracing::debug!(locations = records.len(), "loaded locations");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, id: LocationId) -> &Location {
        &self.locations[id.index()]
    }

    pub fn lookup(&self, location_id: &str) -> Option<LocationId> {
        self.by_id.get(location_id).copied()
    }

    /// True when `ancestor` is `location` or contains it.
    pub fn contains(&self, ancestor: LocationId, location: LocationId) -> bool {
        let mut current = Some(location);
        // Step bound keeps a malformed tree from spinning.
        for _ in 0..=self.locations.len() {
            match current {
                Some(c) if c == ancestor => return true,
                Some(c) => current = self.get(c).parent,
                None => return false,
            }
        }
        false
    }
}

/// A provider's statement that a taxon occurs in a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub provider: ProviderId,
    pub location: LocationId,
    pub life_stage: Option<String>,
    pub occurrence_status: Option<OccurrenceStatus>,
}

impl Distribution {
    pub fn new(provider: ProviderId, location: LocationId) -> Self {
        Self {
            provider,
            location,
            life_stage: None,
            occurrence_status: None,
        }
    }

    /// Does this statement already say everything `other` says?
    pub fn covers(&self, other: &Distribution, locations: &LocationRegistry) -> bool {
        if !locations.contains(self.location, other.location) {
            return false;
        }
        if self.life_stage.is_some() && self.life_stage != other.life_stage {
            return false;
        }
        if self.occurrence_status.is_some() && self.occurrence_status != other.occurrence_status {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LocationRegistry {
        let mut reg = LocationRegistry::new();
        let rec = |id: &str, parent: Option<&str>| LocationRecord {
            location_id: id.into(),
            parent_location_id: parent.map(str::to_string),
            locality: id.into(),
            geography_type: None,
        };
        reg.load(&[rec("nsw", Some("aus")), rec("aus", None), rec("nz", None)])
            .unwrap();
        reg
    }

    #[test]
    fn parent_locations_cover_children() {
        let reg = registry();
        let p = ProviderId::from_index(0);
        let aus = Distribution::new(p, reg.lookup("aus").unwrap());
        let nsw = Distribution::new(p, reg.lookup("nsw").unwrap());
        let nz = Distribution::new(p, reg.lookup("nz").unwrap());
        assert!(aus.covers(&nsw, &reg));
        assert!(aus.covers(&aus, &reg));
        assert!(!nsw.covers(&aus, &reg));
        assert!(!aus.covers(&nz, &reg));
    }

    #[test]
    fn qualified_statements_only_cover_matching_qualifiers() {
        let reg = registry();
        let p = ProviderId::from_index(0);
        let mut adult = Distribution::new(p, reg.lookup("aus").unwrap());
        adult.life_stage = Some("adult".into());
        let plain = Distribution::new(p, reg.lookup("nsw").unwrap());
        assert!(!adult.covers(&plain, &reg));
        let mut adult_nsw = plain.clone();
        adult_nsw.life_stage = Some("adult".into());
        assert!(adult.covers(&adult_nsw, &reg));
    }

    #[test]
    fn unknown_parent_location_is_an_error() {
        let mut reg = LocationRegistry::new();
        let r = LocationRecord {
            location_id: "x".into(),
            parent_location_id: Some("missing".into()),
            ..LocationRecord::default()
        };
        assert!(matches!(reg.load(&[r]), Err(TaxonomyError::UnknownLocation(_))));
    }
}
