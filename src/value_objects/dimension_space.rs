//! Dimension space points and sets of them
//!
//! A dimension space point is a coordinate in the n-dimensional content
//! space spanned by the configured content dimensions, e.g.
//! `{"language": "de", "market": "CH"}`. Points are immutable and compared
//! structurally; the coordinate order of the input never matters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ValueObjectError;

/// One point in the dimension space
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct DimensionSpacePoint {
    coordinates: BTreeMap<String, String>,
    hash: String,
}

impl DimensionSpacePoint {
    /// Create a point from a dimension name to value mapping
    pub fn new(coordinates: BTreeMap<String, String>) -> Result<Self, ValueObjectError> {
        for (dimension, value) in &coordinates {
            if dimension.trim().is_empty() {
                return Err(ValueObjectError::InvalidDimensionSpacePoint(
                    "dimension names must not be empty".to_string(),
                ));
            }
            if value.trim().is_empty() {
                return Err(ValueObjectError::InvalidDimensionSpacePoint(format!(
                    "value of dimension \"{dimension}\" must not be empty"
                )));
            }
        }
        let hash = Self::compute_hash(&coordinates);
        Ok(Self { coordinates, hash })
    }

    /// Create a point from any iterable of `(dimension, value)` pairs
    ///
    /// Only the shape is checked here. Whether the dimensions and values
    /// are configured is up to
    /// [`InterDimensionalVariationGraph::validate_point`](crate::dimension::InterDimensionalVariationGraph::validate_point).
    pub fn from_array<I, K, V>(coordinates: I) -> Result<Self, ValueObjectError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            coordinates
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Create a point from a JSON object whose values are all strings
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, ValueObjectError> {
        let object = value.as_object().ok_or_else(|| {
            ValueObjectError::InvalidDimensionSpacePoint(format!(
                "expected an object of dimension values, got {value}"
            ))
        })?;
        let mut coordinates = BTreeMap::new();
        for (dimension, coordinate) in object {
            let coordinate = coordinate.as_str().ok_or_else(|| {
                ValueObjectError::InvalidDimensionSpacePoint(format!(
                    "value of dimension \"{dimension}\" must be a string, got {coordinate}"
                ))
            })?;
            coordinates.insert(dimension.clone(), coordinate.to_string());
        }
        Self::new(coordinates)
    }

    /// The point of a dimensionless content repository
    pub fn empty() -> Self {
        let coordinates = BTreeMap::new();
        let hash = Self::compute_hash(&coordinates);
        Self { coordinates, hash }
    }

    /// Value of one dimension, if the point has it
    pub fn coordinate(&self, dimension: &str) -> Option<&str> {
        self.coordinates.get(dimension).map(String::as_str)
    }

    /// All coordinates, sorted by dimension name
    pub fn coordinates(&self) -> &BTreeMap<String, String> {
        &self.coordinates
    }

    /// Stable content hash, usable as identity and cache key
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Cache entry identifier; identical to the hash
    pub fn cache_entry_identifier(&self) -> &str {
        &self.hash
    }

    /// A copy of this point with one coordinate replaced
    pub fn vary(&self, dimension: &str, value: &str) -> Self {
        let mut coordinates = self.coordinates.clone();
        coordinates.insert(dimension.to_string(), value.to_string());
        let hash = Self::compute_hash(&coordinates);
        Self { coordinates, hash }
    }

    /// JSON representation, e.g. `{"language":"de"}`
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.coordinates).unwrap_or_default()
    }

    fn compute_hash(coordinates: &BTreeMap<String, String>) -> String {
        let mut hasher = blake3::Hasher::new();
        for (dimension, value) in coordinates {
            hasher.update(dimension.as_bytes());
            hasher.update(&[0x1f]);
            hasher.update(value.as_bytes());
            hasher.update(&[0x1e]);
        }
        hasher.finalize().to_hex().as_str()[..32].to_string()
    }
}

impl TryFrom<BTreeMap<String, String>> for DimensionSpacePoint {
    type Error = ValueObjectError;

    fn try_from(value: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DimensionSpacePoint> for BTreeMap<String, String> {
    fn from(value: DimensionSpacePoint) -> Self {
        value.coordinates
    }
}

impl fmt::Display for DimensionSpacePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

/// The dimension space point a node variant was originally created at
///
/// Distinguishes the authoritative variant from the points it merely
/// covers through specialization or shine-through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginDimensionSpacePoint(DimensionSpacePoint);

impl OriginDimensionSpacePoint {
    /// Wrap a dimension space point as origin
    pub fn from_dimension_space_point(point: DimensionSpacePoint) -> Self {
        Self(point)
    }

    /// Create an origin from `(dimension, value)` pairs
    pub fn from_array<I, K, V>(coordinates: I) -> Result<Self, ValueObjectError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        DimensionSpacePoint::from_array(coordinates).map(Self)
    }

    /// The origin as plain dimension space point
    pub fn to_dimension_space_point(&self) -> DimensionSpacePoint {
        self.0.clone()
    }

    /// Borrow the underlying point
    pub fn as_dimension_space_point(&self) -> &DimensionSpacePoint {
        &self.0
    }

    /// Stable content hash of the underlying point
    pub fn hash(&self) -> &str {
        self.0.hash()
    }
}

impl From<DimensionSpacePoint> for OriginDimensionSpacePoint {
    fn from(point: DimensionSpacePoint) -> Self {
        Self(point)
    }
}

impl fmt::Display for OriginDimensionSpacePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Immutable set of dimension space points, deduplicated by hash
///
/// Iteration follows insertion order; equality ignores it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<DimensionSpacePoint>", into = "Vec<DimensionSpacePoint>")]
pub struct DimensionSpacePointSet {
    points: IndexMap<String, DimensionSpacePoint>,
}

impl DimensionSpacePointSet {
    /// Build a set from any collection of points
    pub fn new(points: impl IntoIterator<Item = DimensionSpacePoint>) -> Self {
        Self {
            points: points
                .into_iter()
                .map(|point| (point.hash().to_string(), point))
                .collect(),
        }
    }

    /// The empty set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Structural membership test
    pub fn contains(&self, point: &DimensionSpacePoint) -> bool {
        self.points.contains_key(point.hash())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionSpacePoint> {
        self.points.values()
    }

    /// All points as owned vector
    pub fn to_vec(&self) -> Vec<DimensionSpacePoint> {
        self.points.values().cloned().collect()
    }

    /// A new set also containing `point`
    pub fn with(&self, point: DimensionSpacePoint) -> Self {
        let mut points = self.points.clone();
        points.insert(point.hash().to_string(), point);
        Self { points }
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut points = self.points.clone();
        for point in other.iter() {
            points.insert(point.hash().to_string(), point.clone());
        }
        Self { points }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self::new(self.iter().filter(|p| other.contains(p)).cloned())
    }

    pub fn difference(&self, other: &Self) -> Self {
        Self::new(self.iter().filter(|p| !other.contains(p)).cloned())
    }

    /// True if every point of `self` is in `other`
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.iter().all(|p| other.contains(p))
    }
}

impl PartialEq for DimensionSpacePointSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset_of(other)
    }
}

impl Eq for DimensionSpacePointSet {}

impl From<Vec<DimensionSpacePoint>> for DimensionSpacePointSet {
    fn from(points: Vec<DimensionSpacePoint>) -> Self {
        Self::new(points)
    }
}

impl From<DimensionSpacePointSet> for Vec<DimensionSpacePoint> {
    fn from(set: DimensionSpacePointSet) -> Self {
        set.points.into_values().collect()
    }
}

impl FromIterator<DimensionSpacePoint> for DimensionSpacePointSet {
    fn from_iter<T: IntoIterator<Item = DimensionSpacePoint>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a DimensionSpacePointSet {
    type Item = &'a DimensionSpacePoint;
    type IntoIter = indexmap::map::Values<'a, String, DimensionSpacePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.values()
    }
}

impl fmt::Display for DimensionSpacePointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.iter().map(DimensionSpacePoint::to_json).collect();
        write!(f, "[{}]", rendered.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn point(language: &str) -> DimensionSpacePoint {
        DimensionSpacePoint::from_array([("language", language)]).unwrap()
    }

    #[test]
    fn test_equality_ignores_coordinate_order() {
        let a = DimensionSpacePoint::from_array([("language", "de"), ("market", "CH")]).unwrap();
        let b = DimensionSpacePoint::from_array([("market", "CH"), ("language", "de")]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.cache_entry_identifier(), b.hash());
    }

    #[test]
    fn test_distinct_points_have_distinct_hashes() {
        assert_ne!(point("de").hash(), point("en").hash());
        // separators keep "a"+"bc" apart from "ab"+"c"
        let a = DimensionSpacePoint::from_array([("a", "bc")]).unwrap();
        let b = DimensionSpacePoint::from_array([("ab", "c")]).unwrap();
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_rejects_empty_values() {
        assert!(DimensionSpacePoint::from_array([("language", "")]).is_err());
        assert!(DimensionSpacePoint::from_array([("", "de")]).is_err());
    }

    #[test]
    fn test_from_json_value_requires_string_coordinates() {
        let ok = DimensionSpacePoint::from_json_value(&serde_json::json!({"language": "de"}));
        assert_eq!(ok.unwrap(), point("de"));

        let err = DimensionSpacePoint::from_json_value(&serde_json::json!({"language": 1}));
        assert!(err.is_err());
        assert!(DimensionSpacePoint::from_json_value(&serde_json::json!("de")).is_err());
    }

    #[test]
    fn test_vary_returns_new_point() {
        let de = point("de");
        let en = de.vary("language", "en");
        assert_eq!(de.coordinate("language"), Some("de"));
        assert_eq!(en, point("en"));
    }

    #[test]
    fn test_set_membership_is_structural() {
        let set = DimensionSpacePointSet::new([point("de"), point("en")]);
        assert!(!set.contains(&point("fr")));
        // separately constructed, structurally equal instance
        let other_de = DimensionSpacePoint::from_array([("language".to_string(), "de".to_string())]).unwrap();
        assert!(set.contains(&other_de));
    }

    #[test]
    fn test_set_deduplicates_and_compares_unordered() {
        let a = DimensionSpacePointSet::new([point("de"), point("en"), point("de")]);
        let b = DimensionSpacePointSet::new([point("en"), point("de")]);
        assert_eq!(a.len(), 2);
        assert_eq!(a, b);
        assert_ne!(a, DimensionSpacePointSet::new([point("en")]));
    }

    #[test]
    fn test_set_algebra() {
        let a = DimensionSpacePointSet::new([point("de"), point("en")]);
        let b = DimensionSpacePointSet::new([point("en"), point("fr")]);
        assert_eq!(a.union(&b).len(), 3);
        assert_eq!(a.intersection(&b), DimensionSpacePointSet::new([point("en")]));
        assert_eq!(a.difference(&b), DimensionSpacePointSet::new([point("de")]));
        assert!(DimensionSpacePointSet::new([point("de")]).is_subset_of(&a));
        // the original sets are untouched
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_serialization_shape() {
        let origin = OriginDimensionSpacePoint::from_array([("language", "de")]).unwrap();
        assert_eq!(serde_json::to_string(&origin).unwrap(), r#"{"language":"de"}"#);

        let set: DimensionSpacePointSet =
            serde_json::from_str(r#"[{"language":"de"},{"language":"en"}]"#).unwrap();
        assert!(set.contains(&point("en")));
    }

    proptest! {
        #[test]
        fn prop_hash_is_independent_of_insertion_order(
            entries in proptest::collection::btree_map("[a-z]{1,6}", "[a-z]{1,6}", 0..5)
        ) {
            let forward: Vec<(String, String)> = entries.clone().into_iter().collect();
            let mut backward = forward.clone();
            backward.reverse();
            let a = DimensionSpacePoint::from_array(forward).unwrap();
            let b = DimensionSpacePoint::from_array(backward).unwrap();
            prop_assert_eq!(a.hash(), b.hash());
            prop_assert!(DimensionSpacePointSet::new([a]).contains(&b));
        }
    }
}
