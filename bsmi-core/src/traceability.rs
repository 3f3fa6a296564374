//! Traceability graph between requirements
//!
//! Requirements are selected by partitions, pairs of a specification and an
//! ordered list of categories. Each partition becomes a subgraph holding one
//! nested subgraph per category. A requirement is placed in the first
//! partition/category that selects it and skipped afterwards. Node ids are
//! sanitized short names, so a later requirement whose id is already taken
//! is left out as well. Edges are the
//! requirement-to-requirement relationships whose two ends are both placed.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use uuid::Uuid;

use crate::error::{BsmiError, Result};
use crate::index::ModelIndex;
use crate::models::{Category, Requirement, Specification};

/// Graph name used when the model has no short name
const DEFAULT_GRAPH_NAME: &str = "traceability";

/// Makes a short name usable as a bare DOT identifier
pub fn sanitize_identifier(short_name: &str) -> String {
    short_name.replace(['-', ' '], "_")
}

/// A specification and the categories that select its requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub specification: Uuid,
    pub categories: Vec<Uuid>,
}

impl Partition {
    pub fn new(specification: Uuid, categories: Vec<Uuid>) -> Self {
        Self {
            specification,
            categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub requirement: Uuid,
    /// Sanitized short name, also used as label
    pub id: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySubgraph {
    pub name: String,
    pub nodes: Vec<GraphNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificationSubgraph {
    pub name: String,
    pub categories: Vec<CategorySubgraph>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// "<source short name> -> <target short name>"
    pub tooltip: String,
}

/// The partitioned traceability graph of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDocument {
    pub name: String,
    pub subgraphs: Vec<SpecificationSubgraph>,
    pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
    /// All nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.subgraphs
            .iter()
            .flat_map(|s| s.categories.iter())
            .flat_map(|c| c.nodes.iter())
    }

    /// Serializes the graph in Graphviz DOT syntax
    pub fn to_dot(&self) -> String {
        let mut out = String::new();

        // writing into a String cannot fail
        let _ = writeln!(out, "digraph {} {{", self.name);
        out.push_str("  rankdir=LR;\n");
        out.push_str("  node [shape=box, style=filled, fillcolor=white, fontname=\"Helvetica\"];\n");
        out.push('\n');

        for subgraph in &self.subgraphs {
            out.push('\n');
            let _ = writeln!(out, "    subgraph specification_{} {{", subgraph.name);
            let _ = writeln!(out, "      label=\"{}\";", subgraph.name);
            out.push_str("      style=filled;\n");
            out.push_str("      color=lightgrey;\n");

            for category in &subgraph.categories {
                let _ = writeln!(out, "        subgraph category_{} {{", category.name);
                let _ = writeln!(out, "          label=\"{}\";", category.name);
                out.push('\n');
                for node in &category.nodes {
                    let _ = writeln!(
                        out,
                        "          {} [label=\"{}\", tooltip=\"{}\"];",
                        node.id,
                        node.id,
                        escape_quoted(&node.tooltip)
                    );
                }
                out.push_str("        }\n");
            }

            out.push('\n');
            out.push_str("    }\n");
        }

        out.push('\n');
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "  {} -> {} [tooltip=\"{}\"];",
                edge.source,
                edge.target,
                escape_quoted(&edge.tooltip)
            );
        }

        out.push_str("}\n");
        out
    }
}

/// Escapes text for use inside a double-quoted DOT string
fn escape_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Builds a [`GraphDocument`] from an index and a list of partitions
#[derive(Default)]
pub struct TraceabilityGraphBuilder<'i, 'a> {
    index: Option<&'i ModelIndex<'a>>,
    partitions: Option<Vec<Partition>>,
}

impl<'i, 'a> TraceabilityGraphBuilder<'i, 'a> {
    pub fn new() -> Self {
        Self {
            index: None,
            partitions: None,
        }
    }

    pub fn iteration(mut self, index: &'i ModelIndex<'a>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn partitions(mut self, partitions: Vec<Partition>) -> Self {
        self.partitions = Some(partitions);
        self
    }

    pub fn build(&self) -> Result<GraphDocument> {
        let index = self.index.ok_or(BsmiError::NullIteration)?;
        let partitions = self.partitions.as_ref().ok_or(BsmiError::NullPartitions)?;
        if partitions.is_empty() {
            return Err(BsmiError::EmptyPartitionList);
        }

        // resolve everything up front so that no partial graph is produced
        let mut resolved = Vec::with_capacity(partitions.len());
        for partition in partitions {
            let specification = index.specification(partition.specification).ok_or_else(|| {
                BsmiError::MalformedModel(format!(
                    "partition refers to unknown specification {}",
                    partition.specification
                ))
            })?;
            let categories = partition
                .categories
                .iter()
                .map(|id| {
                    index.category(*id).ok_or_else(|| {
                        BsmiError::MalformedModel(format!("partition refers to unknown category {}", id))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            resolved.push((specification, categories));
        }

        log::info!("building traceability graph over {} partitions", resolved.len());

        let mut declared = HashMap::new();
        let subgraphs = resolved
            .iter()
            .map(|(specification, categories)| {
                specification_subgraph(index, specification, categories, &mut declared)
            })
            .collect();
        let placed: HashSet<Uuid> = declared.values().copied().collect();

        let mut pairs = HashSet::new();
        let mut edges = Vec::new();
        for (_, source, target) in index.requirement_relationships() {
            if !placed.contains(&source.id) || !placed.contains(&target.id) {
                continue;
            }
            if !pairs.insert((source.id, target.id)) {
                continue;
            }
            edges.push(GraphEdge {
                source: sanitize_identifier(&source.short_name),
                target: sanitize_identifier(&target.short_name),
                tooltip: format!("{} -> {}", source.short_name, target.short_name),
            });
        }

        let model = &index.iteration().model.short_name;
        let name = if model.is_empty() {
            DEFAULT_GRAPH_NAME.to_string()
        } else {
            sanitize_identifier(model)
        };

        let document = GraphDocument {
            name,
            subgraphs,
            edges,
        };
        log::debug!(
            "traceability graph has {} nodes and {} edges",
            document.nodes().count(),
            document.edges.len()
        );
        Ok(document)
    }
}

fn specification_subgraph(
    index: &ModelIndex<'_>,
    specification: &Specification,
    categories: &[&Category],
    declared: &mut HashMap<String, Uuid>,
) -> SpecificationSubgraph {
    let mut requirements: Vec<&Requirement> = specification
        .requirements
        .iter()
        .filter(|r| !r.retired)
        .collect();
    requirements.sort_by(|a, b| a.short_name.cmp(&b.short_name));

    let categories = categories
        .iter()
        .map(|category| {
            let nodes = requirements
                .iter()
                .filter(|r| index.is_member_of_category(r, category.id))
                .filter_map(|r| {
                    let id = sanitize_identifier(&r.short_name);
                    match declared.entry(id.clone()) {
                        Entry::Vacant(entry) => {
                            entry.insert(r.id);
                        }
                        Entry::Occupied(entry) => {
                            if *entry.get() != r.id {
                                log::warn!(
                                    "requirement {} has node id {} which is already taken, skipped",
                                    r.short_name,
                                    id
                                );
                            }
                            return None;
                        }
                    }
                    Some(GraphNode {
                        requirement: r.id,
                        id,
                        tooltip: node_tooltip(index, r),
                    })
                })
                .collect();
            CategorySubgraph {
                name: sanitize_identifier(&category.short_name),
                nodes,
            }
        })
        .collect();

    SpecificationSubgraph {
        name: sanitize_identifier(&specification.short_name),
        categories,
    }
}

fn node_tooltip(index: &ModelIndex<'_>, requirement: &Requirement) -> String {
    let owner = index.owner_short_name(requirement);
    format!(
        "{} [{}] \n {} \n {} \n {}",
        requirement.short_name,
        owner,
        requirement.definition_content(),
        index.category_summary(requirement),
        owner
    )
}

/// Turns `SPEC:CAT1:CAT2` arguments into partitions
///
/// Unknown specifications are skipped, and so are unknown categories. A
/// specification whose categories are all unknown is kept with an empty
/// category list.
pub fn resolve_partition_arguments(index: &ModelIndex<'_>, arguments: &[String]) -> Result<Vec<Partition>> {
    if arguments.is_empty() {
        return Err(BsmiError::NullPartitions);
    }

    let mut partitions = Vec::new();
    for argument in arguments {
        let mut parts = argument.split(':').filter(|p| !p.is_empty());
        let Some(specification) = parts.next() else {
            return Err(BsmiError::InvalidPartitionArgument(argument.clone()));
        };

        let Some(specification) = index.specification_by_short_name(specification) else {
            log::warn!("specification {} not found in the iteration, skipped", specification);
            continue;
        };

        let categories = parts
            .filter_map(|short_name| match index.category_by_short_name(short_name) {
                Some(category) => Some(category.id),
                None => {
                    log::warn!("category {} not found in the iteration, skipped", short_name);
                    None
                }
            })
            .collect();

        partitions.push(Partition::new(specification.id, categories));
    }

    if partitions.is_empty() {
        return Err(BsmiError::EmptyPartitionList);
    }
    Ok(partitions)
}
