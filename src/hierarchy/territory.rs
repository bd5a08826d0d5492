use std::collections::{BTreeMap, HashMap};

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::hierarchy::{PolicyError, Zone};

/// Name of the single department-level territorial unit
pub const DEPARTMENT: &str = "Cauca";

/// Static zone -> municipality table with a reverse index.
///
/// Lookups fold case, surrounding whitespace and Spanish accents so that
/// "Inza", "inzá" and " INZÁ " all resolve to the canonical "Inzá".
#[derive(Debug, Clone)]
pub struct TerritoryCatalog {
    zones: BTreeMap<Zone, Vec<String>>,
    // folded name -> (canonical name, zone)
    index: HashMap<String, (String, Zone)>,
}

impl TerritoryCatalog {
    /// Build a catalog, rejecting any municipality listed under two zones
    pub fn new(zones: BTreeMap<Zone, Vec<String>>) -> Result<Self, PolicyError> {
        let mut index = HashMap::new();
        for (zone, municipalities) in &zones {
            for name in municipalities {
                let key = fold(name);
                if let Some((_, first)) = index.insert(key, (name.clone(), *zone)) {
                    return Err(PolicyError::DuplicateMunicipality {
                        municipality: name.clone(),
                        first,
                        second: *zone,
                    });
                }
            }
        }
        Ok(Self { zones, index })
    }

    /// The department's standard partition into five zones
    pub fn cauca() -> Self {
        let table: [(Zone, &[&str]); 5] = [
            (
                Zone::Norte,
                &[
                    "Buenos Aires",
                    "Caldono",
                    "Caloto",
                    "Corinto",
                    "Guachené",
                    "Inzá",
                    "Jambaló",
                    "Miranda",
                    "Padilla",
                    "Páez",
                    "Puerto Tejada",
                    "Santander de Quilichao",
                    "Suárez",
                    "Toribío",
                    "Villa Rica",
                ],
            ),
            (
                Zone::Centro,
                &[
                    "Cajibío", "El Tambo", "Morales", "Piendamó", "Popayán", "Puracé", "Silvia", "Sotará",
                    "Timbío", "Totoró",
                ],
            ),
            (
                Zone::Sur,
                &["Argelia", "Balboa", "Bolívar", "Florencia", "Mercaderes", "Patía", "Sucre"],
            ),
            (
                Zone::Oriente,
                &["Almaguer", "La Sierra", "La Vega", "Piamonte", "Rosas", "San Sebastián", "Santa Rosa"],
            ),
            (Zone::Occidente, &["Guapí", "López de Micay", "Timbiquí"]),
        ];

        let zones = table
            .iter()
            .map(|(zone, names)| (*zone, names.iter().map(|n| n.to_string()).collect()))
            .collect();

        let mut index = HashMap::new();
        for (zone, names) in table.iter() {
            for name in names.iter() {
                index.insert(fold(name), (name.to_string(), *zone));
            }
        }
        Self { zones, index }
    }

    /// Zone that owns the municipality
    pub fn zone_of(&self, municipality: &str) -> Result<Zone, PolicyError> {
        self.index
            .get(&fold(municipality))
            .map(|(_, zone)| *zone)
            .ok_or_else(|| PolicyError::UnknownMunicipality(municipality.to_string()))
    }

    /// Canonical spelling of a municipality, if it exists
    pub fn canonical_municipality(&self, municipality: &str) -> Option<&str> {
        self.index.get(&fold(municipality)).map(|(name, _)| name.as_str())
    }

    /// Canonical spelling and owning zone in one lookup
    pub fn resolve(&self, municipality: &str) -> Option<(&str, Zone)> {
        self.index
            .get(&fold(municipality))
            .map(|(name, zone)| (name.as_str(), *zone))
    }

    pub fn municipalities_in(&self, zone: Zone) -> &[String] {
        self.zones.get(&zone).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every municipality, grouped by zone in zone order
    pub fn all_municipalities(&self) -> impl Iterator<Item = (&str, Zone)> + '_ {
        self.zones
            .iter()
            .flat_map(|(zone, names)| names.iter().map(move |name| (name.as_str(), *zone)))
    }

    pub fn municipality_count(&self) -> usize {
        self.index.len()
    }

    pub fn zones(&self) -> impl Iterator<Item = Zone> + '_ {
        self.zones.keys().copied()
    }
}

impl Default for TerritoryCatalog {
    fn default() -> Self {
        Self::cauca()
    }
}

/// Normalize a place name for comparison. Composed and decomposed
/// spellings fold to the same key.
fn fold(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_municipality_belongs_to_exactly_one_zone() {
        let catalog = TerritoryCatalog::cauca();
        assert_eq!(catalog.municipality_count(), 42);

        let listed: usize = Zone::ALL.iter().map(|z| catalog.municipalities_in(*z).len()).sum();
        assert_eq!(listed, catalog.municipality_count(), "a municipality is listed twice");

        // the standard table must also pass the checked constructor
        let zones = Zone::ALL
            .iter()
            .map(|z| (*z, catalog.municipalities_in(*z).to_vec()))
            .collect();
        assert!(TerritoryCatalog::new(zones).is_ok());
    }

    #[test]
    fn resolves_zone_ignoring_accents_and_case() {
        let catalog = TerritoryCatalog::cauca();
        assert_eq!(catalog.zone_of("Inza").unwrap(), Zone::Norte);
        assert_eq!(catalog.zone_of("  POPAYAN ").unwrap(), Zone::Centro);
        assert_eq!(catalog.zone_of("lopez  de micay").unwrap(), Zone::Occidente);
        assert_eq!(catalog.canonical_municipality("inza"), Some("Inzá"));
    }

    #[test]
    fn decomposed_input_matches_composed_names() {
        let catalog = TerritoryCatalog::cauca();
        assert_eq!(catalog.zone_of("Popaya\u{301}n").unwrap(), Zone::Centro);
        assert_eq!(catalog.canonical_municipality("INZA\u{301}"), Some("Inzá"));
        assert_eq!(catalog.zone_of("Pa\u{301}ez").unwrap(), Zone::Norte);
        assert_eq!(catalog.zone_of("Lo\u{301}pez de Micay").unwrap(), Zone::Occidente);
    }

    #[test]
    fn unknown_municipality_is_not_found() {
        let catalog = TerritoryCatalog::cauca();
        let err = catalog.zone_of("Cali").unwrap_err();
        assert!(matches!(err, PolicyError::UnknownMunicipality(name) if name == "Cali"));
    }

    #[test]
    fn rejects_duplicate_municipalities() {
        let mut zones = BTreeMap::new();
        zones.insert(Zone::Norte, vec!["Caloto".to_string()]);
        zones.insert(Zone::Sur, vec!["caloto".to_string()]);

        let err = TerritoryCatalog::new(zones).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::DuplicateMunicipality { first: Zone::Norte, second: Zone::Sur, .. }
        ));
    }
}
