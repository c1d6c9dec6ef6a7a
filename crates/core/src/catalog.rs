//! Document-type catalog and the required document set.
//!
//! Both are reference data supplied by the caller. The engine ships a
//! built-in offshore default so the CLI and tests have something to run
//! against, but deployments are expected to load their own.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Occupational health certificate (Atestado de Saúde Ocupacional).
pub const CODE_ASO: &str = "ASO";
/// Basic offshore safety course.
pub const CODE_CBSP: &str = "CBSP";
/// Helicopter underwater escape training.
pub const CODE_HUET: &str = "HUET";
/// Work at height.
pub const CODE_NR35: &str = "NR-35";
/// Confined spaces.
pub const CODE_NR33: &str = "NR-33";
/// Electrical safety.
pub const CODE_NR10: &str = "NR-10";
/// National identity card.
pub const CODE_RG: &str = "RG";
/// Taxpayer registration.
pub const CODE_CPF: &str = "CPF";

/// Codes mandatory for offshore eligibility unless configured otherwise.
pub const DEFAULT_REQUIRED_CODES: &[&str] = &[
    CODE_ASO, CODE_CBSP, CODE_HUET, CODE_NR35, CODE_NR33, CODE_NR10, CODE_RG, CODE_CPF,
];

/// Maximum length of a document-type code.
pub const MAX_CODE_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// A catalog entry describing one kind of certificate or document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub code: String,
    pub name: String,
    pub category: String,
    /// Identity documents and similar never expire.
    pub requires_expiration: bool,
}

impl DocumentType {
    pub fn new(code: &str, name: &str, category: &str, requires_expiration: bool) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            requires_expiration,
        }
    }
}

/// Lookup of [`DocumentType`] by code.
#[derive(Debug, Clone, Default)]
pub struct DocumentCatalog {
    types: HashMap<String, DocumentType>,
}

impl DocumentCatalog {
    /// Build a catalog. A later entry with the same code replaces an earlier one.
    pub fn new(types: impl IntoIterator<Item = DocumentType>) -> Self {
        Self {
            types: types.into_iter().map(|t| (t.code.clone(), t)).collect(),
        }
    }

    /// The built-in offshore catalog.
    pub fn offshore_default() -> Self {
        Self::new([
            DocumentType::new(CODE_ASO, "Atestado de Saúde Ocupacional", "saude", true),
            DocumentType::new(CODE_CBSP, "Curso Básico de Segurança de Plataforma", "treinamento", true),
            DocumentType::new(CODE_HUET, "Helicopter Underwater Escape Training", "treinamento", true),
            DocumentType::new(CODE_NR35, "NR-35 Trabalho em Altura", "norma", true),
            DocumentType::new(CODE_NR33, "NR-33 Espaço Confinado", "norma", true),
            DocumentType::new(CODE_NR10, "NR-10 Segurança em Eletricidade", "norma", true),
            DocumentType::new(CODE_RG, "Registro Geral", "identidade", false),
            DocumentType::new(CODE_CPF, "Cadastro de Pessoa Física", "identidade", false),
        ])
    }

    pub fn get(&self, code: &str) -> Option<&DocumentType> {
        self.types.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.types.contains_key(code)
    }

    /// Resolve the required codes against the catalog, in required-set
    /// order. Codes with no catalog entry are left out of evaluation.
    pub fn required_types<'a>(&'a self, required: &RequiredDocumentSet) -> Vec<&'a DocumentType> {
        required
            .iter()
            .filter_map(|code| {
                let found = self.types.get(code);
                if found.is_none() {
                    tracing::warn!(code, "Required document code has no catalog entry, skipping");
                }
                found
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Required set
// ---------------------------------------------------------------------------

/// Ordered, de-duplicated list of document-type codes mandatory for
/// offshore eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RequiredDocumentSet {
    codes: Vec<String>,
}

impl RequiredDocumentSet {
    /// Build a set from raw codes. Codes are trimmed; duplicates keep their
    /// first position. Empty or oversized codes are rejected.
    pub fn new<I, S>(codes: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for (i, raw) in codes.into_iter().enumerate() {
            let code = validate_code(raw.as_ref())
                .map_err(|e| CoreError::Validation(format!("required code [{i}]: {e}")))?;
            if !out.iter().any(|c| c == code) {
                out.push(code.to_string());
            }
        }
        Ok(Self { codes: out })
    }

    /// The built-in offshore default set.
    pub fn offshore_default() -> Self {
        Self {
            codes: DEFAULT_REQUIRED_CODES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl TryFrom<Vec<String>> for RequiredDocumentSet {
    type Error = CoreError;

    fn try_from(codes: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(codes)
    }
}

impl From<RequiredDocumentSet> for Vec<String> {
    fn from(set: RequiredDocumentSet) -> Self {
        set.codes
    }
}

/// Validate a single document-type code, returning it trimmed.
pub fn validate_code(raw: &str) -> Result<&str, String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err("code must not be empty".to_string());
    }
    if code.len() > MAX_CODE_LENGTH {
        return Err(format!(
            "code '{code}' exceeds maximum length of {MAX_CODE_LENGTH}"
        ));
    }
    Ok(code)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
