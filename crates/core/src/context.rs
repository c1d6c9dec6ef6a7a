//! Evaluation context shared by the aggregators.

use chrono::NaiveDate;

use crate::catalog::{DocumentCatalog, DocumentType, RequiredDocumentSet};
use crate::config::ComplianceConfig;

/// Reference data and clock for one evaluation pass.
///
/// `today` is always supplied by the caller; nothing in the engine reads the
/// wall clock.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    pub catalog: &'a DocumentCatalog,
    pub required: &'a RequiredDocumentSet,
    pub today: NaiveDate,
    pub config: ComplianceConfig,
    /// Required codes resolved once against the catalog. Codes the catalog
    /// does not know are absent.
    required_types: Vec<&'a DocumentType>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        catalog: &'a DocumentCatalog,
        required: &'a RequiredDocumentSet,
        today: NaiveDate,
    ) -> Self {
        Self {
            catalog,
            required,
            today,
            config: ComplianceConfig::default(),
            required_types: catalog.required_types(required),
        }
    }

    pub fn with_config(mut self, config: ComplianceConfig) -> Self {
        self.config = config;
        self
    }

    /// The document types evaluated for every employee, in required-set order.
    pub fn required_types(&self) -> &[&'a DocumentType] {
        &self.required_types
    }
}
