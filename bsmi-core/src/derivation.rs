//! In- and outlinks between requirements
//!
//! Only relationships with a requirement at both ends take part. Retired
//! requirements are left out, and no deduplication is done: a relationship
//! stored twice yields two entries.

use crate::index::ModelIndex;
use crate::models::{Requirement, ThingRef};

/// Derivation lookups over an indexed iteration
pub struct DerivationIndex<'i, 'a> {
    index: &'i ModelIndex<'a>,
}

impl<'i, 'a> DerivationIndex<'i, 'a> {
    pub fn new(index: &'i ModelIndex<'a>) -> Self {
        Self { index }
    }

    /// Requirements that derive from `requirement` (sources of links into it)
    pub fn incoming(&self, requirement: &Requirement) -> Vec<&'a Requirement> {
        self.index
            .relationships_to(ThingRef::Requirement(requirement.id))
            .iter()
            .filter_map(|rel| rel.source.as_requirement())
            .filter_map(|id| self.index.requirement(id))
            .filter(|r| !r.retired)
            .collect()
    }

    /// Requirements `requirement` derives from (targets of links out of it)
    pub fn outgoing(&self, requirement: &Requirement) -> Vec<&'a Requirement> {
        self.index
            .relationships_from(ThingRef::Requirement(requirement.id))
            .iter()
            .filter_map(|rel| rel.target.as_requirement())
            .filter_map(|id| self.index.requirement(id))
            .filter(|r| !r.retired)
            .collect()
    }

    pub fn incoming_short_names(&self, requirement: &Requirement) -> Vec<&'a str> {
        self.incoming(requirement)
            .into_iter()
            .map(|r| r.short_name.as_str())
            .collect()
    }

    pub fn outgoing_short_names(&self, requirement: &Requirement) -> Vec<&'a str> {
        self.outgoing(requirement)
            .into_iter()
            .map(|r| r.short_name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SampleModel;
    use crate::models::Relationship;

    #[test]
    fn test_no_incoming_links_is_empty() {
        let sample = SampleModel::new();
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let derivation = DerivationIndex::new(&index);

        let r2 = index.requirement(sample.r2).unwrap();
        assert!(derivation.incoming_short_names(r2).is_empty());
        assert_eq!(derivation.outgoing_short_names(r2), vec!["R-1"]);
    }

    #[test]
    fn test_incoming_in_relationship_order_without_retired() {
        let sample = SampleModel::new();
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let derivation = DerivationIndex::new(&index);

        // R-5 also links to R-1 but is retired
        let r1 = index.requirement(sample.r1).unwrap();
        assert_eq!(derivation.incoming_short_names(r1), vec!["R-4", "R-2"]);
        assert!(derivation.outgoing_short_names(r1).is_empty());
    }

    #[test]
    fn test_element_sources_are_not_links() {
        let sample = SampleModel::new();
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let derivation = DerivationIndex::new(&index);

        // Payload satisfies R-4 but is not a requirement
        let r4 = index.requirement(sample.r4).unwrap();
        assert!(derivation.incoming(r4).is_empty());
    }

    #[test]
    fn test_duplicate_relationship_yields_two_entries() {
        let mut sample = SampleModel::new();
        sample.iteration.relationships.push(Relationship::satisfies(
            ThingRef::Requirement(sample.r2),
            ThingRef::Requirement(sample.r1),
        ));
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let derivation = DerivationIndex::new(&index);

        let r1 = index.requirement(sample.r1).unwrap();
        assert_eq!(derivation.incoming_short_names(r1), vec!["R-4", "R-2", "R-2"]);
    }
}
