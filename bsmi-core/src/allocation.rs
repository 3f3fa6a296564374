//! Allocation of requirements to BSMI codes
//!
//! For one option, the resolver walks the nested element tree, picks up the
//! allocation parameter carried by each nested element and follows the
//! "satisfies" relationships from the parameter's element definition to the
//! requirements it satisfies. Requirements that are not reached this way get
//! their directly-held code, or the fallback code.
//!
//! The first code seen for a requirement wins; nested elements are visited in
//! provider order and relationships in iteration order.

use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

use crate::error::{BsmiError, Result};
use crate::index::ModelIndex;
use crate::models::{
    ModelOption, Relationship, RelationshipKind, Requirement, Specification, ThingRef,
    ALLOCATION_PARAMETER, UNALLOCATED_SENTINEL,
};
use crate::nested::{NestedElement, NestedElementProvider};

/// How the code of an allocation record was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationSource {
    /// Through equipment in the nested element tree
    Structural,
    /// From a parameter value held by the requirement itself
    Direct,
    /// The fallback code for unallocated requirements
    Fallback,
}

/// The allocation of one requirement within one option
#[derive(Debug, Clone)]
pub struct AllocationRecord<'a> {
    pub requirement: &'a Requirement,
    pub code: String,
    pub source: AllocationSource,
    /// Contributing relationships, unique, in discovery order
    pub relationships: Vec<&'a Relationship>,
    /// Contributing nested elements, unique by path, in discovery order
    pub nested_elements: Vec<NestedElement>,
}

impl<'a> AllocationRecord<'a> {
    fn new(requirement: &'a Requirement, code: impl Into<String>, source: AllocationSource) -> Self {
        Self {
            requirement,
            code: code.into(),
            source,
            relationships: Vec::new(),
            nested_elements: Vec::new(),
        }
    }

    fn add_relationship(&mut self, relationship: &'a Relationship) {
        if !self.relationships.iter().any(|r| r.id == relationship.id) {
            self.relationships.push(relationship);
        }
    }

    fn add_nested_element(&mut self, nested: &NestedElement) {
        if !self.nested_elements.iter().any(|n| n.path == nested.path) {
            self.nested_elements.push(nested.clone());
        }
    }

    /// Comma separated ids of the contributing relationships
    pub fn relationship_ids(&self) -> String {
        self.relationships
            .iter()
            .map(|r| r.id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A non-fatal finding made while resolving or reporting allocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationWarning {
    /// A requirement was reached with a different code than the one recorded
    Conflict {
        requirement: String,
        kept: String,
        proposed: String,
    },
    /// A requirement has no structural or direct code and got the fallback
    Unallocated { requirement: String, fallback: String },
    /// An allocation code is not a 4-digit number
    MalformedCode { requirement: String, code: String },
}

impl fmt::Display for AllocationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationWarning::Conflict {
                requirement,
                kept,
                proposed,
            } => write!(
                f,
                "requirement {} has been linked to multiple BSMI codes: keeping {}, ignoring {}",
                requirement, kept, proposed
            ),
            AllocationWarning::Unallocated {
                requirement,
                fallback,
            } => write!(
                f,
                "requirement {} has not been linked to a BSMI code and is added to BSMI {}",
                requirement, fallback
            ),
            AllocationWarning::MalformedCode { requirement, code } => write!(
                f,
                "requirement {} has BSMI code '{}' which is not a 4-digit number",
                requirement, code
            ),
        }
    }
}

/// Result of resolving the allocations of one option
#[derive(Debug, Clone)]
pub struct Allocation<'a> {
    pub option: Uuid,
    /// Records sorted by code; ties keep discovery order
    pub records: Vec<AllocationRecord<'a>>,
    pub warnings: Vec<AllocationWarning>,
}

impl<'a> Allocation<'a> {
    pub fn record_for(&self, requirement: Uuid) -> Option<&AllocationRecord<'a>> {
        self.records.iter().find(|r| r.requirement.id == requirement)
    }
}

/// Resolves requirement allocations against an indexed iteration
pub struct AllocationResolver<'i, 'a> {
    index: &'i ModelIndex<'a>,
    parameter: String,
    sentinel: String,
}

impl<'i, 'a> AllocationResolver<'i, 'a> {
    pub fn new(index: &'i ModelIndex<'a>) -> Self {
        Self {
            index,
            parameter: ALLOCATION_PARAMETER.to_string(),
            sentinel: UNALLOCATED_SENTINEL.to_string(),
        }
    }

    /// Uses another parameter short name as allocation marker
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = parameter.into();
        self
    }

    /// Uses another sentinel for "no direct code"
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Expands the option with `provider` and resolves the resulting tree
    pub fn resolve_option(
        &self,
        provider: &dyn NestedElementProvider,
        specifications: &[&Specification],
        option: &ModelOption,
        include_empty_containers: bool,
        fallback_code: &str,
    ) -> Result<Allocation<'a>> {
        let nested = provider.expand_nested_elements(option, include_empty_containers)?;
        self.resolve(specifications, option, &nested, fallback_code)
    }

    /// Resolves the allocations of `option` from its nested element tree
    pub fn resolve(
        &self,
        specifications: &[&Specification],
        option: &ModelOption,
        nested_elements: &[NestedElement],
        fallback_code: &str,
    ) -> Result<Allocation<'a>> {
        log::info!(
            "resolving BSMI allocation for option {} over {} nested elements",
            option.short_name,
            nested_elements.len()
        );

        let selected: HashSet<Uuid> = specifications.iter().map(|s| s.id).collect();
        let mut records: Vec<AllocationRecord<'a>> = Vec::new();
        let mut positions: HashMap<Uuid, usize> = HashMap::new();
        let mut warnings = Vec::new();

        for nested in nested_elements {
            let Some(value) = nested
                .parameters
                .iter()
                .find(|p| p.short_name == self.parameter && p.is_plain())
            else {
                continue;
            };

            if self.index.element(value.owner).is_none() {
                return Err(BsmiError::MalformedModel(format!(
                    "parameter {} of nested element {} is owned by an unknown element",
                    value.short_name, nested.path
                )));
            }

            for &relationship in self.index.relationships_from(ThingRef::Element(value.owner)) {
                if relationship.kind != RelationshipKind::Satisfies {
                    continue;
                }
                let Some(target) = relationship.target.as_requirement() else {
                    continue;
                };
                let requirement = self.index.requirement(target).ok_or_else(|| {
                    BsmiError::MalformedModel(format!(
                        "relationship {} targets an unknown requirement",
                        relationship.id
                    ))
                })?;

                if requirement.retired {
                    continue;
                }
                if !selected.contains(&self.index.container_of(requirement.id)?.id) {
                    continue;
                }

                let position = *positions.entry(requirement.id).or_insert_with(|| {
                    records.push(AllocationRecord::new(
                        requirement,
                        value.actual_value.clone(),
                        AllocationSource::Structural,
                    ));
                    records.len() - 1
                });

                let record = &mut records[position];
                record.add_relationship(relationship);
                record.add_nested_element(nested);

                if record.code != value.actual_value {
                    let warning = AllocationWarning::Conflict {
                        requirement: requirement.short_name.clone(),
                        kept: record.code.clone(),
                        proposed: value.actual_value.clone(),
                    };
                    log::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        for spec in specifications {
            for candidate in spec.requirements.iter().filter(|r| !r.retired) {
                if positions.contains_key(&candidate.id) {
                    continue;
                }
                let requirement = self.index.requirement(candidate.id).ok_or_else(|| {
                    BsmiError::MalformedModel(format!(
                        "requirement {} of specification {} is not part of the iteration",
                        candidate.short_name, spec.short_name
                    ))
                })?;

                let record = match requirement.simple_parameter_value(&self.parameter) {
                    Some(code) if !code.is_empty() && code != self.sentinel => {
                        AllocationRecord::new(requirement, code, AllocationSource::Direct)
                    }
                    _ => {
                        let warning = AllocationWarning::Unallocated {
                            requirement: requirement.short_name.clone(),
                            fallback: fallback_code.to_string(),
                        };
                        log::warn!("{}", warning);
                        warnings.push(warning);
                        AllocationRecord::new(requirement, fallback_code, AllocationSource::Fallback)
                    }
                };

                positions.insert(requirement.id, records.len());
                records.push(record);
            }
        }

        // stable: equal codes keep discovery order
        records.sort_by(|a, b| a.code.cmp(&b.code));

        log::debug!(
            "option {}: {} allocation records, {} warnings",
            option.short_name,
            records.len(),
            warnings.len()
        );

        Ok(Allocation {
            option: option.id,
            records,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SampleModel;
    use crate::models::{ElementUsage, Parameter, SimpleParameterValue};
    use crate::nested::NestedElementTreeGenerator;

    fn resolve_sample<'a>(
        index: &ModelIndex<'a>,
        specifications: &[&Specification],
    ) -> Allocation<'a> {
        let option = &index.iteration().options[0];
        let generator = NestedElementTreeGenerator::new(index);
        AllocationResolver::new(index)
            .resolve_option(&generator, specifications, option, false, "9999")
            .unwrap()
    }

    #[test]
    fn test_structural_allocation_and_fallback() {
        let sample = SampleModel::new();
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();

        let allocation = resolve_sample(&index, &[spec_a]);

        let codes: Vec<(&str, &str)> = allocation
            .records
            .iter()
            .map(|r| (r.requirement.short_name.as_str(), r.code.as_str()))
            .collect();
        assert_eq!(codes, vec![("R-1", "1200"), ("R-4", "1230"), ("R-2", "9999")]);

        let r1 = allocation.record_for(sample.r1).unwrap();
        assert_eq!(r1.source, AllocationSource::Structural);
        assert_eq!(r1.nested_elements[0].path, "SAT.BUS");

        let r2 = allocation.record_for(sample.r2).unwrap();
        assert_eq!(r2.source, AllocationSource::Fallback);
        assert_eq!(
            allocation.warnings,
            vec![AllocationWarning::Unallocated {
                requirement: "R-2".to_string(),
                fallback: "9999".to_string()
            }]
        );
    }

    #[test]
    fn test_equal_codes_keep_discovery_order() {
        let mut sample = SampleModel::new();
        // PAY is expanded before BUS and both carry 1200
        sample.iteration.elements[0].usages.reverse();
        sample.iteration.elements[2].parameters[0].value = "1200".to_string();
        sample.iteration.specifications[0]
            .requirements
            .push(Requirement::new("R-0", "Late unallocated requirement"));
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();

        let allocation = resolve_sample(&index, &[spec_a]);

        let codes: Vec<(&str, &str)> = allocation
            .records
            .iter()
            .map(|r| (r.requirement.short_name.as_str(), r.code.as_str()))
            .collect();
        assert_eq!(
            codes,
            vec![("R-4", "1200"), ("R-1", "1200"), ("R-2", "9999"), ("R-0", "9999")]
        );
    }

    #[test]
    fn test_retired_and_unselected_requirements_are_skipped() {
        let mut sample = SampleModel::new();
        // Payload also satisfies the retired R-3 in SPEC-B
        sample.iteration.relationships.push(Relationship::satisfies(
            ThingRef::Element(sample.payload),
            ThingRef::Requirement(sample.r3),
        ));
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();

        let allocation = resolve_sample(&index, &[spec_a]);
        assert!(allocation.record_for(sample.r3).is_none());
        assert!(allocation.record_for(sample.r5).is_none());
        assert_eq!(allocation.record_for(sample.r2).unwrap().code, "9999");
    }

    #[test]
    fn test_unselected_specification_is_not_allocated() {
        let mut sample = SampleModel::new();
        sample.iteration.specifications[1].requirements[0].retired = false;
        sample.iteration.relationships.push(Relationship::satisfies(
            ThingRef::Element(sample.bus),
            ThingRef::Requirement(sample.r3),
        ));
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();
        let spec_b = index.specification(sample.spec_b).unwrap();

        assert!(resolve_sample(&index, &[spec_a]).record_for(sample.r3).is_none());

        let both = resolve_sample(&index, &[spec_a, spec_b]);
        assert_eq!(both.record_for(sample.r3).unwrap().code, "1200");
    }

    #[test]
    fn test_same_element_twice_counts_distinct_relationships() {
        let mut sample = SampleModel::new();
        let bus = sample.bus;
        sample.iteration.elements[0]
            .usages
            .push(ElementUsage::new("BUS-REDUNDANT", bus));
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();

        let allocation = resolve_sample(&index, &[spec_a]);
        let r1_records: Vec<_> = allocation
            .records
            .iter()
            .filter(|r| r.requirement.id == sample.r1)
            .collect();
        assert_eq!(r1_records.len(), 1);
        assert_eq!(r1_records[0].relationships.len(), 1);
        assert_eq!(r1_records[0].nested_elements.len(), 2);
        assert!(allocation
            .warnings
            .iter()
            .all(|w| !matches!(w, AllocationWarning::Conflict { .. })));
    }

    #[test]
    fn test_conflict_keeps_first_seen_code() {
        let mut sample = SampleModel::new();
        // Payload (1230) now also satisfies R-1, reached after Bus (1200)
        sample.iteration.relationships.push(Relationship::satisfies(
            ThingRef::Element(sample.payload),
            ThingRef::Requirement(sample.r1),
        ));
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();

        let allocation = resolve_sample(&index, &[spec_a]);
        let r1 = allocation.record_for(sample.r1).unwrap();
        assert_eq!(r1.code, "1200");
        assert_eq!(r1.relationships.len(), 2);
        assert!(allocation.warnings.contains(&AllocationWarning::Conflict {
            requirement: "R-1".to_string(),
            kept: "1200".to_string(),
            proposed: "1230".to_string(),
        }));
    }

    #[test]
    fn test_direct_code_and_sentinel() {
        let mut sample = SampleModel::new();
        let reqs = &mut sample.iteration.specifications[0].requirements;
        reqs[1].parameter_values.push(SimpleParameterValue {
            short_name: "BSMI".to_string(),
            value: "1100".to_string(),
        });
        let mut r6 = Requirement::new("R-6", "sentinel");
        r6.parameter_values.push(SimpleParameterValue {
            short_name: "BSMI".to_string(),
            value: "-".to_string(),
        });
        let r6_id = r6.id;
        reqs.push(r6);

        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();
        let allocation = resolve_sample(&index, &[spec_a]);

        let r2 = allocation.record_for(sample.r2).unwrap();
        assert_eq!((r2.code.as_str(), r2.source), ("1100", AllocationSource::Direct));

        let r6 = allocation.record_for(r6_id).unwrap();
        assert_eq!((r6.code.as_str(), r6.source), ("9999", AllocationSource::Fallback));
        assert_eq!(allocation.warnings.len(), 1);

        let order: Vec<&str> = allocation.records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(order, vec!["1100", "1200", "1230", "9999"]);
    }

    #[test]
    fn test_compound_and_differently_named_values_are_ignored() {
        let mut sample = SampleModel::new();
        sample.iteration.elements[2].parameters[0].compound = true;
        sample.iteration.elements[1].parameters.insert(0, Parameter::new("bsmi", "1111"));
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();

        let allocation = resolve_sample(&index, &[spec_a]);
        assert_eq!(allocation.record_for(sample.r1).unwrap().code, "1200");
        assert_eq!(allocation.record_for(sample.r4).unwrap().source, AllocationSource::Fallback);
    }

    #[test]
    fn test_custom_parameter_name() {
        let mut sample = SampleModel::new();
        sample.iteration.elements[1].parameters.push(Parameter::new("PBS", "2000"));
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();
        let generator = NestedElementTreeGenerator::new(&index);

        let allocation = AllocationResolver::new(&index)
            .with_parameter("PBS")
            .resolve_option(&generator, &[spec_a], sample.option(), false, "0001")
            .unwrap();
        assert_eq!(allocation.record_for(sample.r1).unwrap().code, "2000");
        assert_eq!(allocation.record_for(sample.r4).unwrap().code, "0001");
    }

    #[test]
    fn test_unknown_parameter_owner_is_malformed() {
        let sample = SampleModel::new();
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();
        let nested = vec![NestedElement {
            path: "GHOST".to_string(),
            element: Uuid::new_v4(),
            usage: None,
            option: sample.option,
            parameters: vec![crate::nested::ParameterValue {
                short_name: "BSMI".to_string(),
                parameter: Uuid::new_v4(),
                owner: Uuid::new_v4(),
                kind: crate::nested::ParameterKind::Parameter,
                compound: false,
                actual_value: "1000".to_string(),
            }],
        }];

        let err = AllocationResolver::new(&index)
            .resolve(&[spec_a], sample.option(), &nested, "9999")
            .unwrap_err();
        assert!(matches!(err, BsmiError::MalformedModel(_)));
    }
}
