//! Specialization and generalization relations between dimension space points

use std::collections::BTreeMap;

use super::{ContentDimensionSource, DimensionSpaceError, DimensionSpaceResult};
use crate::value_objects::{DimensionSpacePoint, DimensionSpacePointSet, VariantType};

/// The variation graph over the allowed dimension subspace
///
/// A point `s` specializes `g` if every coordinate of `s` equals or
/// descends from the coordinate of `g` in the same dimension.
#[derive(Debug, Clone)]
pub struct InterDimensionalVariationGraph {
    source: ContentDimensionSource,
    allowed_subspace: DimensionSpacePointSet,
}

impl InterDimensionalVariationGraph {
    pub fn new(source: ContentDimensionSource) -> Self {
        let allowed_subspace = Self::cartesian_product(&source);
        Self {
            source,
            allowed_subspace,
        }
    }

    fn cartesian_product(source: &ContentDimensionSource) -> DimensionSpacePointSet {
        let mut combinations: Vec<BTreeMap<String, String>> = vec![BTreeMap::new()];
        for dimension in source.dimensions() {
            let mut next = Vec::new();
            for combination in &combinations {
                for value in dimension.values() {
                    let mut extended = combination.clone();
                    extended.insert(dimension.id().to_string(), value.value.clone());
                    next.push(extended);
                }
            }
            combinations = next;
        }
        combinations
            .into_iter()
            .filter_map(|coordinates| DimensionSpacePoint::new(coordinates).ok())
            .collect()
    }

    pub fn dimension_source(&self) -> &ContentDimensionSource {
        &self.source
    }

    /// Every point the configured dimensions allow
    pub fn allowed_dimension_subspace(&self) -> &DimensionSpacePointSet {
        &self.allowed_subspace
    }

    pub fn contains(&self, point: &DimensionSpacePoint) -> bool {
        self.allowed_subspace.contains(point)
    }

    /// Check a point names exactly the configured dimensions with known values
    pub fn validate_point(&self, point: &DimensionSpacePoint) -> DimensionSpaceResult<()> {
        for (dimension_id, value) in point.coordinates() {
            let dimension = self.source.dimension(dimension_id).ok_or_else(|| {
                DimensionSpaceError::InvalidArgument(format!(
                    "unknown content dimension \"{dimension_id}\" in {point}"
                ))
            })?;
            if dimension.value(value).is_none() {
                return Err(DimensionSpaceError::InvalidArgument(format!(
                    "unknown value \"{value}\" of content dimension \"{dimension_id}\""
                )));
            }
        }
        for dimension in self.source.dimensions() {
            if point.coordinate(dimension.id()).is_none() {
                return Err(DimensionSpaceError::InvalidArgument(format!(
                    "{point} lacks a value for content dimension \"{}\"",
                    dimension.id()
                )));
            }
        }
        Ok(())
    }

    fn require_allowed(&self, point: &DimensionSpacePoint) -> DimensionSpaceResult<()> {
        if self.contains(point) {
            Ok(())
        } else {
            Err(DimensionSpaceError::DimensionSpacePointNotFound(point.clone()))
        }
    }

    fn is_specialization_or_self(&self, special: &DimensionSpacePoint, general: &DimensionSpacePoint) -> bool {
        if special.coordinates().len() != general.coordinates().len() {
            return false;
        }
        general.coordinates().iter().all(|(dimension_id, general_value)| {
            match (self.source.dimension(dimension_id), special.coordinate(dimension_id)) {
                (Some(dimension), Some(special_value)) => {
                    dimension.is_generalization_or_self(general_value, special_value)
                }
                _ => false,
            }
        })
    }

    /// The point itself plus all of its specializations
    pub fn specialization_set(&self, origin: &DimensionSpacePoint) -> DimensionSpaceResult<DimensionSpacePointSet> {
        self.require_allowed(origin)?;
        Ok(self
            .allowed_subspace
            .iter()
            .filter(|candidate| self.is_specialization_or_self(candidate, origin))
            .cloned()
            .collect())
    }

    /// Strict generalizations of the point
    pub fn generalizations(&self, specialization: &DimensionSpacePoint) -> DimensionSpaceResult<DimensionSpacePointSet> {
        self.require_allowed(specialization)?;
        Ok(self
            .allowed_subspace
            .iter()
            .filter(|candidate| {
                *candidate != specialization && self.is_specialization_or_self(specialization, candidate)
            })
            .cloned()
            .collect())
    }

    /// True if `general` is a strict generalization of `special`
    pub fn is_generalization_of(&self, general: &DimensionSpacePoint, special: &DimensionSpacePoint) -> bool {
        general != special && self.is_specialization_or_self(special, general)
    }

    /// How `subject` relates to `object`
    pub fn variant_type(&self, subject: &DimensionSpacePoint, object: &DimensionSpacePoint) -> VariantType {
        if subject == object {
            VariantType::Same
        } else if self.is_specialization_or_self(subject, object) {
            VariantType::Specialization
        } else if self.is_specialization_or_self(object, subject) {
            VariantType::Generalization
        } else {
            VariantType::Peer
        }
    }
}
