//! Read-only lookup structures over a loaded iteration
//!
//! The index is built once per invocation and borrows the iteration for its
//! whole lifetime. Back-references (requirement to specification, parameter
//! to element definition) are answered by id lookups instead of pointers.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::{BsmiError, Result};
use crate::models::{
    Category, DomainOfExpertise, ElementDefinition, Iteration, Relationship, Requirement,
    Specification, ThingRef,
};

/// Lookup tables over an [`Iteration`]
#[derive(Debug)]
pub struct ModelIndex<'a> {
    iteration: &'a Iteration,
    specifications: HashMap<Uuid, &'a Specification>,
    requirements: HashMap<Uuid, &'a Requirement>,
    containers: HashMap<Uuid, &'a Specification>,
    categories: HashMap<Uuid, &'a Category>,
    domains: HashMap<Uuid, &'a DomainOfExpertise>,
    elements: HashMap<Uuid, &'a ElementDefinition>,
    by_source: HashMap<ThingRef, Vec<&'a Relationship>>,
    by_target: HashMap<ThingRef, Vec<&'a Relationship>>,
}

impl<'a> ModelIndex<'a> {
    /// Builds the index, failing with `MalformedModel` on dangling references
    pub fn build(iteration: &'a Iteration) -> Result<Self> {
        let mut index = Self {
            iteration,
            specifications: HashMap::new(),
            requirements: HashMap::new(),
            containers: HashMap::new(),
            categories: HashMap::new(),
            domains: HashMap::new(),
            elements: HashMap::new(),
            by_source: HashMap::new(),
            by_target: HashMap::new(),
        };

        for category in &iteration.categories {
            index.categories.insert(category.id, category);
        }
        for domain in &iteration.domains {
            index.domains.insert(domain.id, domain);
        }

        for spec in &iteration.specifications {
            index.specifications.insert(spec.id, spec);

            for req in &spec.requirements {
                if index.containers.insert(req.id, spec).is_some() {
                    return Err(BsmiError::MalformedModel(format!(
                        "requirement {} is contained in more than one specification",
                        req.short_name
                    )));
                }
                index.requirements.insert(req.id, req);
            }
        }

        for element in &iteration.elements {
            index.elements.insert(element.id, element);
        }

        for rel in &iteration.relationships {
            index.by_source.entry(rel.source).or_default().push(rel);
            index.by_target.entry(rel.target).or_default().push(rel);
        }

        index.validate()?;
        Ok(index)
    }

    fn validate(&self) -> Result<()> {
        for spec in &self.iteration.specifications {
            for group in &spec.groups {
                if let Some(parent) = group.parent {
                    if !spec.groups.iter().any(|g| g.id == parent) {
                        return Err(malformed(format!(
                            "group {} of specification {} has an unknown parent",
                            group.short_name, spec.short_name
                        )));
                    }
                }
            }

            for req in &spec.requirements {
                if let Some(group) = req.group {
                    if !spec.groups.iter().any(|g| g.id == group) {
                        return Err(malformed(format!(
                            "requirement {} refers to a group outside specification {}",
                            req.short_name, spec.short_name
                        )));
                    }
                }
                if let Some(owner) = req.owner {
                    if !self.domains.contains_key(&owner) {
                        return Err(malformed(format!(
                            "requirement {} is owned by an unknown domain",
                            req.short_name
                        )));
                    }
                }
                if let Some(category) = req.categories.iter().find(|c| !self.categories.contains_key(*c)) {
                    return Err(malformed(format!(
                        "requirement {} refers to unknown category {}",
                        req.short_name, category
                    )));
                }
            }
        }

        for element in &self.iteration.elements {
            for usage in &element.usages {
                if !self.elements.contains_key(&usage.element) {
                    return Err(malformed(format!(
                        "element usage {} of {} refers to an unknown element definition",
                        usage.short_name, element.short_name
                    )));
                }
            }
        }

        if let Some(top) = self.iteration.top_element {
            if !self.elements.contains_key(&top) {
                return Err(malformed("top element is not an element definition of the iteration"));
            }
        }

        for rel in &self.iteration.relationships {
            for end in [rel.source, rel.target] {
                if !self.contains_thing(end) {
                    return Err(malformed(format!(
                        "relationship {} refers to unknown {}",
                        rel.id, end
                    )));
                }
            }
        }

        Ok(())
    }

    fn contains_thing(&self, thing: ThingRef) -> bool {
        match thing {
            ThingRef::Element(id) => self.elements.contains_key(&id),
            ThingRef::Requirement(id) => self.requirements.contains_key(&id),
        }
    }

    /// The indexed iteration
    pub fn iteration(&self) -> &'a Iteration {
        self.iteration
    }

    pub fn specification(&self, id: Uuid) -> Option<&'a Specification> {
        self.specifications.get(&id).copied()
    }

    pub fn specification_by_short_name(&self, short_name: &str) -> Option<&'a Specification> {
        self.iteration
            .specifications
            .iter()
            .find(|s| s.short_name == short_name)
    }

    /// Non-retired specifications in stored order
    pub fn active_specifications(&self) -> Vec<&'a Specification> {
        self.iteration
            .specifications
            .iter()
            .filter(|s| !s.retired)
            .collect()
    }

    /// Specifications a report is built from: the named one, or every active
    /// one when no name is given. An unknown name selects nothing.
    pub fn select_specifications(&self, short_name: Option<&str>) -> Vec<&'a Specification> {
        let Some(short_name) = short_name else {
            return self.active_specifications();
        };
        match self.specification_by_short_name(short_name) {
            Some(specification) => vec![specification],
            None => {
                log::warn!(
                    "specification {} not found in the iteration, the report will be empty",
                    short_name
                );
                Vec::new()
            }
        }
    }

    pub fn requirement(&self, id: Uuid) -> Option<&'a Requirement> {
        self.requirements.get(&id).copied()
    }

    /// The specification that contains a requirement
    pub fn container_of(&self, requirement: Uuid) -> Result<&'a Specification> {
        self.containers.get(&requirement).copied().ok_or_else(|| {
            malformed(format!("requirement {} has no containing specification", requirement))
        })
    }

    pub fn category(&self, id: Uuid) -> Option<&'a Category> {
        self.categories.get(&id).copied()
    }

    pub fn category_by_short_name(&self, short_name: &str) -> Option<&'a Category> {
        self.iteration
            .categories
            .iter()
            .find(|c| c.short_name == short_name)
    }

    pub fn element(&self, id: Uuid) -> Option<&'a ElementDefinition> {
        self.elements.get(&id).copied()
    }

    /// Short name of the owning domain, empty when the requirement has no owner
    pub fn owner_short_name(&self, requirement: &Requirement) -> &'a str {
        requirement
            .owner
            .and_then(|id| self.domains.get(&id).copied())
            .map(|d| d.short_name.as_str())
            .unwrap_or("")
    }

    /// Category short names of a requirement, in the order they are applied
    pub fn category_short_names(&self, requirement: &Requirement) -> Vec<&'a str> {
        requirement
            .categories
            .iter()
            .filter_map(|id| self.categories.get(id).copied())
            .map(|c| c.short_name.as_str())
            .collect()
    }

    /// Category summary used in reports and tooltips
    pub fn category_summary(&self, requirement: &Requirement) -> String {
        self.category_short_names(requirement).join(", ")
    }

    /// True when the requirement carries `category` directly or through a
    /// specialization of it
    pub fn is_member_of_category(&self, requirement: &Requirement, category: Uuid) -> bool {
        requirement
            .categories
            .iter()
            .any(|c| *c == category || self.is_specialization_of(*c, category))
    }

    fn is_specialization_of(&self, category: Uuid, general: Uuid) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![category];

        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(cat) = self.categories.get(&id) {
                for parent in &cat.super_categories {
                    if *parent == general {
                        return true;
                    }
                    pending.push(*parent);
                }
            }
        }

        false
    }

    /// Group path of a requirement, `None` for ungrouped requirements
    pub fn group_path(&self, requirement: &Requirement) -> Option<String> {
        let group = requirement.group?;
        let spec = self.containers.get(&requirement.id)?;
        spec.group_path(group, '\\')
    }

    /// Relationships whose source is `thing`, in iteration order
    pub fn relationships_from(&self, thing: ThingRef) -> &[&'a Relationship] {
        self.by_source.get(&thing).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Relationships whose target is `thing`, in iteration order
    pub fn relationships_to(&self, thing: ThingRef) -> &[&'a Relationship] {
        self.by_target.get(&thing).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Relationships between two requirements, in iteration order
    pub fn requirement_relationships(
        &self,
    ) -> impl Iterator<Item = (&'a Relationship, &'a Requirement, &'a Requirement)> + '_ {
        self.iteration.relationships.iter().filter_map(move |rel| {
            let source = self.requirement(rel.source.as_requirement()?)?;
            let target = self.requirement(rel.target.as_requirement()?)?;
            Some((rel, source, target))
        })
    }
}

fn malformed(message: impl Into<String>) -> BsmiError {
    BsmiError::MalformedModel(message.into())
}
