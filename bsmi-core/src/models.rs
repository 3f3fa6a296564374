use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Short name of the parameter that carries an allocation code
pub const ALLOCATION_PARAMETER: &str = "BSMI";

/// Value that marks a directly-held allocation code as "not set"
pub const UNALLOCATED_SENTINEL: &str = "-";

/// Reference to the thing at either end of a relationship
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ThingRef {
    /// An element definition (equipment/product)
    Element(Uuid),
    /// A requirement
    Requirement(Uuid),
}

impl ThingRef {
    /// Returns the requirement id if this end is a requirement
    pub fn as_requirement(&self) -> Option<Uuid> {
        match self {
            ThingRef::Requirement(id) => Some(*id),
            ThingRef::Element(_) => None,
        }
    }

    /// Returns the element id if this end is an element
    pub fn as_element(&self) -> Option<Uuid> {
        match self {
            ThingRef::Element(id) => Some(*id),
            ThingRef::Requirement(_) => None,
        }
    }
}

impl fmt::Display for ThingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThingRef::Element(id) => write!(f, "element {}", id),
            ThingRef::Requirement(id) => write!(f, "requirement {}", id),
        }
    }
}

/// Kind of a binary relationship
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Source fulfills the target requirement
    #[default]
    Satisfies,
    /// Source is derived from the target
    Derives,
    /// Source verifies the target
    Verifies,
    /// Source refines the target
    Refines,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipKind::Satisfies => write!(f, "satisfies"),
            RelationshipKind::Derives => write!(f, "derives"),
            RelationshipKind::Verifies => write!(f, "verifies"),
            RelationshipKind::Refines => write!(f, "refines"),
        }
    }
}

/// A directed binary relationship between two things of the iteration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    pub id: Uuid,
    #[serde(default)]
    pub kind: RelationshipKind,
    pub source: ThingRef,
    pub target: ThingRef,
}

impl Relationship {
    /// Creates a "satisfies" relationship between two things
    pub fn satisfies(source: ThingRef, target: ThingRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: RelationshipKind::Satisfies,
            source,
            target,
        }
    }
}

/// The domain of expertise that owns a requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainOfExpertise {
    pub id: Uuid,
    pub short_name: String,
    #[serde(default)]
    pub name: String,
}

impl DomainOfExpertise {
    pub fn new(short_name: impl Into<String>) -> Self {
        let short_name = short_name.into();
        Self {
            id: Uuid::new_v4(),
            name: short_name.clone(),
            short_name,
        }
    }
}

/// A category (tag) that can be applied to requirements
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub short_name: String,
    #[serde(default)]
    pub name: String,
    /// Categories this category specializes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub super_categories: Vec<Uuid>,
}

impl Category {
    pub fn new(short_name: impl Into<String>) -> Self {
        let short_name = short_name.into();
        Self {
            id: Uuid::new_v4(),
            name: short_name.clone(),
            short_name,
            super_categories: Vec::new(),
        }
    }
}

/// Textual definition of a requirement in some language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Definition {
    #[serde(default = "default_language_code")]
    pub language_code: String,
    pub content: String,
}

fn default_language_code() -> String {
    String::from("en")
}

/// A scalar parameter value held directly by a requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimpleParameterValue {
    pub short_name: String,
    pub value: String,
}

/// Represents a single requirement in a specification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    pub id: Uuid,

    /// Human-friendly identifier, unique within the iteration
    pub short_name: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<Definition>,

    /// Owning domain of expertise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Uuid>,

    /// Group within the containing specification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Uuid>,

    #[serde(default)]
    pub retired: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_values: Vec<SimpleParameterValue>,
}

impl Requirement {
    /// Creates a new requirement with a single definition
    pub fn new(short_name: impl Into<String>, text: impl Into<String>) -> Self {
        let short_name = short_name.into();
        Self {
            id: Uuid::new_v4(),
            name: short_name.clone(),
            short_name,
            definitions: vec![Definition {
                language_code: default_language_code(),
                content: text.into(),
            }],
            owner: None,
            categories: Vec::new(),
            group: None,
            retired: false,
            parameter_values: Vec::new(),
        }
    }

    /// Content of the first definition, empty when there is none
    pub fn definition_content(&self) -> &str {
        self.definitions
            .first()
            .map(|d| d.content.as_str())
            .unwrap_or("")
    }

    /// Looks up a directly-held scalar parameter value by short name
    pub fn simple_parameter_value(&self, short_name: &str) -> Option<&str> {
        self.parameter_values
            .iter()
            .find(|v| v.short_name == short_name)
            .map(|v| v.value.as_str())
    }
}

/// A group of requirements; groups form a tree through `parent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequirementsGroup {
    pub id: Uuid,
    pub short_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,
}

impl RequirementsGroup {
    pub fn new(short_name: impl Into<String>, parent: Option<Uuid>) -> Self {
        let short_name = short_name.into();
        Self {
            id: Uuid::new_v4(),
            name: short_name.clone(),
            short_name,
            parent,
        }
    }
}

/// A requirements specification, the container of requirements and groups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Specification {
    pub id: Uuid,
    pub short_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub retired: bool,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<RequirementsGroup>,
}

impl Specification {
    pub fn new(short_name: impl Into<String>) -> Self {
        let short_name = short_name.into();
        Self {
            id: Uuid::new_v4(),
            name: short_name.clone(),
            short_name,
            retired: false,
            requirements: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// All groups of the specification, parents before children, siblings in stored order
    pub fn groups_depth_first(&self) -> Vec<&RequirementsGroup> {
        fn visit<'s>(
            spec: &'s Specification,
            parent: Option<Uuid>,
            out: &mut Vec<&'s RequirementsGroup>,
        ) {
            for group in spec.groups.iter().filter(|g| g.parent == parent) {
                // guards against parent cycles
                if out.iter().any(|g| g.id == group.id) {
                    continue;
                }
                out.push(group);
                visit(spec, Some(group.id), out);
            }
        }

        let mut ordered = Vec::with_capacity(self.groups.len());
        visit(self, None, &mut ordered);
        ordered
    }

    /// Path of a group from the root group down, joined with `separator`
    pub fn group_path(&self, group_id: Uuid, separator: char) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(group_id);

        while let Some(id) = current {
            let group = self.groups.iter().find(|g| g.id == id)?;
            if names.len() > self.groups.len() {
                return None;
            }
            names.push(group.short_name.as_str());
            current = group.parent;
        }

        names.reverse();
        Some(names.join(&separator.to_string()))
    }
}

/// A parameter of an element definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    pub id: Uuid,
    pub short_name: String,
    /// Compound parameters carry several components and never hold a plain code
    #[serde(default)]
    pub compound: bool,
    #[serde(default)]
    pub value: String,
    /// Option-dependent values keyed by option id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub option_values: BTreeMap<Uuid, String>,
}

impl Parameter {
    pub fn new(short_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            short_name: short_name.into(),
            compound: false,
            value: value.into(),
            option_values: BTreeMap::new(),
        }
    }

    /// Actual value of the parameter in the context of an option
    pub fn value_for(&self, option: Uuid) -> &str {
        self.option_values
            .get(&option)
            .map(String::as_str)
            .unwrap_or(&self.value)
    }
}

/// An override of a parameter value on an element usage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterOverride {
    pub id: Uuid,
    /// The overridden parameter of the usage's element definition
    pub parameter: Uuid,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub option_values: BTreeMap<Uuid, String>,
}

impl ParameterOverride {
    pub fn value_for(&self, option: Uuid) -> &str {
        self.option_values
            .get(&option)
            .map(String::as_str)
            .unwrap_or(&self.value)
    }
}

/// Usage of an element definition inside another element definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElementUsage {
    pub id: Uuid,
    pub short_name: String,
    /// The used element definition
    pub element: Uuid,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_options: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_overrides: Vec<ParameterOverride>,
}

impl ElementUsage {
    pub fn new(short_name: impl Into<String>, element: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            short_name: short_name.into(),
            element,
            excluded_options: Vec::new(),
            parameter_overrides: Vec::new(),
        }
    }
}

/// Equipment or product node of the product tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElementDefinition {
    pub id: Uuid,
    pub short_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub usages: Vec<ElementUsage>,
}

impl ElementDefinition {
    pub fn new(short_name: impl Into<String>) -> Self {
        let short_name = short_name.into();
        Self {
            id: Uuid::new_v4(),
            name: short_name.clone(),
            short_name,
            parameters: Vec::new(),
            usages: Vec::new(),
        }
    }
}

/// A design option, the context in which the product tree is expanded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelOption {
    pub id: Uuid,
    pub short_name: String,
    #[serde(default)]
    pub name: String,
}

impl ModelOption {
    pub fn new(short_name: impl Into<String>) -> Self {
        let short_name = short_name.into();
        Self {
            id: Uuid::new_v4(),
            name: short_name.clone(),
            short_name,
        }
    }
}

/// Information about the engineering model an iteration belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ModelInfo {
    pub short_name: String,
    pub name: String,
    pub definition: String,
}

/// A fully materialized iteration of an engineering model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Iteration {
    pub number: u32,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    /// Filled in by the model provider from the containing model
    #[serde(skip)]
    pub model: ModelInfo,

    #[serde(default)]
    pub specifications: Vec<Specification>,

    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub domains: Vec<DomainOfExpertise>,

    #[serde(default)]
    pub elements: Vec<ElementDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_element: Option<Uuid>,

    #[serde(default)]
    pub options: Vec<ModelOption>,

    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Iteration {
    /// Creates an empty iteration
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }
}

/// A person that may open the model, with the domains they may act for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub username: String,
    #[serde(default)]
    pub domains: Vec<String>,
}

/// An engineering model and its iterations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineeringModel {
    pub short_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub iterations: Vec<Iteration>,
}

/// Contents of a model snapshot file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelSnapshot {
    #[serde(default)]
    pub models: Vec<EngineeringModel>,
}
