//! Substitution repository operations.
//!
//! The substitution list is owned by exactly one edit session; the host
//! serializes edits. Adding a rule whose target path is already taken is not
//! an error and not a silent merge: it is returned as a conflict descriptor
//! the caller resolves, after which no duplicate target paths exist.

use crate::error::ValidationError;
use crate::model::{Direction, Mapping, MappingSubstitution};

/// Outcome of [`Mapping::add_substitution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// A rule with the same target path exists. Nothing was modified; the
    /// caller decides between dropping `incoming` and
    /// [`Mapping::overwrite_substitution`].
    Conflict(SubstitutionConflict),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionConflict {
    pub existing_index: usize,
    pub incoming: MappingSubstitution,
}

impl Mapping {
    /// Append a substitution, unless one with the same target path exists.
    pub fn add_substitution(&mut self, substitution: MappingSubstitution) -> AddOutcome {
        match self
            .substitutions
            .iter()
            .position(|s| s.path_target == substitution.path_target)
        {
            Some(existing_index) => AddOutcome::Conflict(SubstitutionConflict {
                existing_index,
                incoming: substitution,
            }),
            None => {
                self.substitutions.push(substitution);
                AddOutcome::Added
            }
        }
    }

    /// Replace the rule at `index` in place, preserving its list position.
    /// Resolves an [`AddOutcome::Conflict`] in favor of the incoming rule.
    pub fn overwrite_substitution(&mut self, index: usize, substitution: MappingSubstitution) {
        if index < self.substitutions.len() {
            self.substitutions[index] = substitution;
        }
    }

    pub fn remove_substitution_at(&mut self, index: usize) -> Option<MappingSubstitution> {
        if index < self.substitutions.len() {
            Some(self.substitutions.remove(index))
        } else {
            None
        }
    }

    pub fn remove_all_substitutions(&mut self) {
        self.substitutions.clear();
    }

    /// Number of substitutions that define the device identifier for this
    /// mapping's target API.
    pub fn count_device_identifiers(&self) -> usize {
        self.substitutions
            .iter()
            .filter(|s| s.defines_device_identifier(self.target_api, self.direction))
            .count()
    }

    /// First substitution defining the device identifier, if any.
    pub fn find_device_identifier(&self) -> Option<&MappingSubstitution> {
        self.substitutions
            .iter()
            .find(|s| s.defines_device_identifier(self.target_api, self.direction))
    }
}

/// Editing-time check run while the substitution list is being built: the
/// device identifier must be selected exactly once for inbound mappings.
/// The full mapping-level pass lives in [`crate::validator`].
pub fn check_device_identifier(mapping: &Mapping) -> Vec<ValidationError> {
    let mut result = Vec::new();
    if mapping.direction == Direction::Outbound || mapping.mapping_type.is_opaque() {
        return result;
    }
    let count = mapping.count_device_identifiers();
    if count < 1 && !mapping.create_non_existing_device {
        result.push(ValidationError::DeviceIdentifierMustBeSelected);
    }
    if count > 1 {
        result.push(ValidationError::OnlyOneSubstitutionDefiningDeviceIdentifierCanBeUsed);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetApi;

    fn mapping() -> Mapping {
        let json = r#"{"id": "m1", "targetAPI": "MEASUREMENT"}"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn add_then_conflict_on_duplicate_target() {
        let mut m = mapping();
        assert_eq!(
            m.add_substitution(MappingSubstitution::new("$.temp", "c8y_Temperature.value")),
            AddOutcome::Added
        );

        let incoming = MappingSubstitution::new("$.other", "c8y_Temperature.value");
        match m.add_substitution(incoming.clone()) {
            AddOutcome::Conflict(conflict) => {
                assert_eq!(conflict.existing_index, 0);
                assert_eq!(conflict.incoming, incoming);
                // declining leaves the existing rule untouched
                assert_eq!(m.substitutions[0].path_source, "$.temp");

                m.overwrite_substitution(conflict.existing_index, conflict.incoming);
                assert_eq!(m.substitutions.len(), 1);
                assert_eq!(m.substitutions[0].path_source, "$.other");
            }
            AddOutcome::Added => panic!("expected a conflict"),
        }
    }

    #[test]
    fn remove_operations() {
        let mut m = mapping();
        m.add_substitution(MappingSubstitution::new("$.a", "x"));
        m.add_substitution(MappingSubstitution::new("$.b", "y"));
        assert_eq!(m.remove_substitution_at(0).unwrap().path_target, "x");
        assert_eq!(m.remove_substitution_at(5), None);
        m.remove_all_substitutions();
        assert!(m.substitutions.is_empty());
    }

    #[test]
    fn device_identifier_selection_check() {
        let mut m = mapping();
        assert_eq!(m.target_api, TargetApi::Measurement);
        m.add_substitution(MappingSubstitution::new("$.temp", "c8y_Temperature.value"));
        assert_eq!(
            check_device_identifier(&m),
            vec![ValidationError::DeviceIdentifierMustBeSelected]
        );

        m.add_substitution(MappingSubstitution::new("$.id", "source.id"));
        assert!(check_device_identifier(&m).is_empty());
        assert_eq!(m.find_device_identifier().unwrap().path_source, "$.id");

        m.add_substitution(MappingSubstitution::new("$.other", "source.id.x"));
        m.substitutions.push(MappingSubstitution::new("$.dup", "source.id"));
        assert_eq!(
            check_device_identifier(&m),
            vec![ValidationError::OnlyOneSubstitutionDefiningDeviceIdentifierCanBeUsed]
        );
    }

    #[test]
    fn tolerated_when_device_creation_is_delegated() {
        let mut m = mapping();
        m.create_non_existing_device = true;
        assert!(check_device_identifier(&m).is_empty());
    }
}
