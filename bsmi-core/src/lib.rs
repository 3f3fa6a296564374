pub mod allocation;
pub mod config;
pub mod derivation;
pub mod error;
pub mod index;
pub mod models;
pub mod nested;
pub mod object_level;
pub mod provider;
pub mod report;
pub mod traceability;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use allocation::{
    Allocation, AllocationRecord, AllocationResolver, AllocationSource, AllocationWarning,
};
pub use config::{
    default_config_path, resolve_config_path, ToolConfig, CONFIG_ENV, DEFAULT_UNALLOCATED_CODE,
};
pub use derivation::DerivationIndex;
pub use error::{BsmiError, Result};
pub use index::ModelIndex;
pub use models::{
    Category, Definition, DomainOfExpertise, ElementDefinition, ElementUsage, EngineeringModel,
    Iteration, ModelInfo, ModelOption, ModelSnapshot, Parameter, ParameterOverride, Participant,
    Relationship, RelationshipKind, Requirement, RequirementsGroup, SimpleParameterValue,
    Specification, ThingRef,
    // Allocation markers
    ALLOCATION_PARAMETER,
    UNALLOCATED_SENTINEL,
};
pub use nested::{
    NestedElement, NestedElementProvider, NestedElementTreeGenerator, ParameterKind,
    ParameterValue,
};
pub use object_level::compute_object_level;
pub use provider::{
    open_provider, resolve_data_source, Credentials, FileModelProvider, ModelProvider,
    SourceFormat,
};
pub use report::{
    build_workbook, DotFileGenerator, HtmlReportGenerator, JsonReportGenerator, ReportGenerator,
    ReportSettings, Sheet, TabularReportGenerator, Workbook, WorkbookReport, XlsxReportGenerator,
};
pub use traceability::{
    resolve_partition_arguments, sanitize_identifier, GraphDocument, GraphEdge, GraphNode,
    Partition, TraceabilityGraphBuilder,
};
