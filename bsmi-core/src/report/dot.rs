use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::index::ModelIndex;
use crate::report::{check_output, ReportGenerator};
use crate::traceability::{GraphDocument, Partition, TraceabilityGraphBuilder};

/// Writes the traceability graph as a Graphviz dot file
#[derive(Debug, Default, Clone, Copy)]
pub struct DotFileGenerator;

impl DotFileGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Builds the graph over `partitions` and writes it to `output`
    ///
    /// Nothing is written when the arguments are invalid.
    pub fn generate(
        &self,
        index: &ModelIndex<'_>,
        partitions: Vec<Partition>,
        output: &Path,
    ) -> Result<GraphDocument> {
        check_output(self, output)?;
        log::info!("start generating the traceability dot file");

        let document = TraceabilityGraphBuilder::new()
            .iteration(index)
            .partitions(partitions)
            .build()?;
        fs::write(output, document.to_dot())?;

        log::info!("finished generating the traceability dot file {}", output.display());
        Ok(document)
    }
}

impl ReportGenerator for DotFileGenerator {
    fn report_kind(&self) -> &'static str {
        "DOT"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &[".dot"]
    }
}
