//! Option-scoped expansion of the product tree
//!
//! Starting at the iteration's top element, every element usage that is not
//! excluded from the option becomes a [`NestedElement`] carrying the actual
//! values of its parameters for that option.

use uuid::Uuid;

use crate::error::{BsmiError, Result};
use crate::index::ModelIndex;
use crate::models::{ElementDefinition, ElementUsage, ModelOption};

/// Where the actual value of a nested parameter comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// A parameter of the element definition
    Parameter,
    /// An override on the element usage
    Override,
}

/// Actual value of a parameter on a nested element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterValue {
    /// Short name of the parameter, e.g. "BSMI"
    pub short_name: String,
    /// The element definition parameter the value belongs to
    pub parameter: Uuid,
    /// Element definition that owns the parameter
    pub owner: Uuid,
    pub kind: ParameterKind,
    pub compound: bool,
    pub actual_value: String,
}

impl ParameterValue {
    /// True for values of plain, non-compound element definition parameters
    pub fn is_plain(&self) -> bool {
        self.kind == ParameterKind::Parameter && !self.compound
    }
}

/// A structural instance of an element definition within one option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedElement {
    /// Dot separated short names from the top element, e.g. "SAT.BUS"
    pub path: String,
    /// The element definition at this position of the tree
    pub element: Uuid,
    /// The usage through which the element was reached, `None` for the top element
    pub usage: Option<Uuid>,
    pub option: Uuid,
    pub parameters: Vec<ParameterValue>,
}

/// Supplies the nested element tree of an option
pub trait NestedElementProvider {
    fn expand_nested_elements(
        &self,
        option: &ModelOption,
        include_empty_containers: bool,
    ) -> Result<Vec<NestedElement>>;
}

/// Expands the product tree of an indexed iteration
pub struct NestedElementTreeGenerator<'i, 'a> {
    index: &'i ModelIndex<'a>,
}

impl<'i, 'a> NestedElementTreeGenerator<'i, 'a> {
    pub fn new(index: &'i ModelIndex<'a>) -> Self {
        Self { index }
    }

    fn visit(
        &self,
        visit: Visit<'_>,
        option: &ModelOption,
        include_empty_containers: bool,
        stack: &mut Vec<Uuid>,
        out: &mut Vec<NestedElement>,
    ) -> Result<()> {
        let definition = visit.definition;
        if stack.contains(&definition.id) {
            return Err(BsmiError::MalformedModel(format!(
                "element {} contains itself through {}",
                definition.short_name, visit.path
            )));
        }

        let parameters = nested_parameters(definition, visit.usage, option.id);
        if include_empty_containers || !parameters.is_empty() {
            out.push(NestedElement {
                path: visit.path.clone(),
                element: definition.id,
                usage: visit.usage.map(|u| u.id),
                option: option.id,
                parameters,
            });
        }

        stack.push(definition.id);
        for usage in &definition.usages {
            if usage.excluded_options.contains(&option.id) {
                continue;
            }
            let child = self.index.element(usage.element).ok_or_else(|| {
                BsmiError::MalformedModel(format!(
                    "element usage {} refers to an unknown element definition",
                    usage.short_name
                ))
            })?;
            let child_visit = Visit {
                definition: child,
                usage: Some(usage),
                path: format!("{}.{}", visit.path, usage.short_name),
            };
            self.visit(child_visit, option, include_empty_containers, stack, out)?;
        }
        stack.pop();

        Ok(())
    }
}

impl NestedElementProvider for NestedElementTreeGenerator<'_, '_> {
    fn expand_nested_elements(
        &self,
        option: &ModelOption,
        include_empty_containers: bool,
    ) -> Result<Vec<NestedElement>> {
        let mut nested = Vec::new();

        let Some(top) = self.index.iteration().top_element else {
            log::debug!("iteration has no top element, option {} is empty", option.short_name);
            return Ok(nested);
        };
        let top = self.index.element(top).ok_or_else(|| {
            BsmiError::MalformedModel("top element is not an element definition".to_string())
        })?;

        let visit = Visit {
            definition: top,
            usage: None,
            path: top.short_name.clone(),
        };
        self.visit(visit, option, include_empty_containers, &mut Vec::new(), &mut nested)?;

        log::debug!(
            "expanded {} nested elements for option {}",
            nested.len(),
            option.short_name
        );
        Ok(nested)
    }
}

struct Visit<'d> {
    definition: &'d ElementDefinition,
    usage: Option<&'d ElementUsage>,
    path: String,
}

/// Parameter values of a definition as seen through a usage, overrides replacing
/// the values they override
fn nested_parameters(
    definition: &ElementDefinition,
    usage: Option<&ElementUsage>,
    option: Uuid,
) -> Vec<ParameterValue> {
    definition
        .parameters
        .iter()
        .map(|parameter| {
            let overridden = usage.and_then(|u| {
                u.parameter_overrides
                    .iter()
                    .find(|o| o.parameter == parameter.id)
            });

            let (kind, actual_value) = match overridden {
                Some(o) => (ParameterKind::Override, o.value_for(option)),
                None => (ParameterKind::Parameter, parameter.value_for(option)),
            };

            ParameterValue {
                short_name: parameter.short_name.clone(),
                parameter: parameter.id,
                owner: definition.id,
                kind,
                compound: parameter.compound,
                actual_value: actual_value.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SampleModel;
    use crate::models::{ElementUsage, ParameterOverride};

    #[test]
    fn test_expands_depth_first_in_usage_order() {
        let sample = SampleModel::new();
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let generator = NestedElementTreeGenerator::new(&index);

        let nested = generator
            .expand_nested_elements(sample.option(), false)
            .unwrap();
        let paths: Vec<&str> = nested.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["SAT", "SAT.BUS", "SAT.PAY"]);

        let bus = &nested[1];
        assert_eq!(bus.element, sample.bus);
        assert_eq!(bus.parameters[0].short_name, "BSMI");
        assert_eq!(bus.parameters[0].actual_value, "1200");
        assert_eq!(bus.parameters[0].owner, sample.bus);
        assert!(bus.parameters[0].is_plain());
    }

    #[test]
    fn test_excluded_options_and_empty_containers() {
        let mut sample = SampleModel::new();
        let option = sample.option;
        let empty = crate::models::ElementDefinition::new("Harness");
        let empty_id = empty.id;
        sample.iteration.elements.push(empty);
        let sat = &mut sample.iteration.elements[0];
        sat.usages[1].excluded_options.push(option);
        sat.usages.push(ElementUsage::new("HARNESS", empty_id));

        let index = ModelIndex::build(&sample.iteration).unwrap();
        let generator = NestedElementTreeGenerator::new(&index);

        let without_empty = generator.expand_nested_elements(sample.option(), false).unwrap();
        let paths: Vec<&str> = without_empty.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["SAT", "SAT.BUS"]);

        let with_empty = generator.expand_nested_elements(sample.option(), true).unwrap();
        let paths: Vec<&str> = with_empty.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["SAT", "SAT.BUS", "SAT.HARNESS"]);
    }

    #[test]
    fn test_override_replaces_parameter_value() {
        let mut sample = SampleModel::new();
        let bus_parameter = sample.iteration.elements[1].parameters[0].id;
        sample.iteration.elements[0].usages[0]
            .parameter_overrides
            .push(ParameterOverride {
                id: Uuid::new_v4(),
                parameter: bus_parameter,
                value: "1300".to_string(),
                option_values: Default::default(),
            });

        let index = ModelIndex::build(&sample.iteration).unwrap();
        let nested = NestedElementTreeGenerator::new(&index)
            .expand_nested_elements(sample.option(), false)
            .unwrap();

        let bsmi = &nested[1].parameters[0];
        assert_eq!(bsmi.kind, ParameterKind::Override);
        assert_eq!(bsmi.actual_value, "1300");
        assert!(!bsmi.is_plain());
    }

    #[test]
    fn test_usage_cycle_is_malformed() {
        let mut sample = SampleModel::new();
        let sat = sample.sat;
        sample.iteration.elements[1]
            .usages
            .push(ElementUsage::new("LOOP", sat));

        let index = ModelIndex::build(&sample.iteration).unwrap();
        let err = NestedElementTreeGenerator::new(&index)
            .expand_nested_elements(sample.option(), true)
            .unwrap_err();
        assert!(matches!(err, BsmiError::MalformedModel(_)));
    }

    #[test]
    fn test_no_top_element_yields_nothing() {
        let mut sample = SampleModel::new();
        sample.iteration.top_element = None;

        let index = ModelIndex::build(&sample.iteration).unwrap();
        let nested = NestedElementTreeGenerator::new(&index)
            .expand_nested_elements(sample.option(), true)
            .unwrap();
        assert!(nested.is_empty());
    }
}
