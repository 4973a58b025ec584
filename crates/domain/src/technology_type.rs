//! Technology type — the catalog row describing an installable technology.

use serde::{Deserialize, Serialize};

use crate::error::{DomoError, ValidationError};
use crate::id::TechnologyTypeId;

/// A persisted technology-type row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnologyType {
    pub id: TechnologyTypeId,
    /// Family name the registry resolves by (`"zwave"`, `"demo"`, …).
    pub kind: String,
    /// Implementation language of the module, informational only.
    pub language: String,
    /// Filesystem or package path of the module, informational only.
    pub path: String,
}

impl TechnologyType {
    #[must_use]
    pub fn builder() -> TechnologyTypeBuilder {
        TechnologyTypeBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when `kind` is empty.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.kind.is_empty() {
            return Err(ValidationError::EmptyTechnologyKind.into());
        }
        Ok(())
    }
}

/// Field payload for a technology type that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTechnologyType {
    pub kind: String,
    pub language: String,
    pub path: String,
}

impl NewTechnologyType {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when `kind` is empty.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.kind.is_empty() {
            return Err(ValidationError::EmptyTechnologyKind.into());
        }
        Ok(())
    }

    /// Attach the store-assigned id, producing a persisted [`TechnologyType`].
    #[must_use]
    pub fn into_technology_type(self, id: TechnologyTypeId) -> TechnologyType {
        TechnologyType {
            id,
            kind: self.kind,
            language: self.language,
            path: self.path,
        }
    }
}

#[derive(Debug, Default)]
pub struct TechnologyTypeBuilder {
    kind: Option<String>,
    language: Option<String>,
    path: Option<String>,
}

impl TechnologyTypeBuilder {
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Consume the builder, apply field defaults, validate, and return a
    /// [`NewTechnologyType`].
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if `kind` is missing or empty.
    pub fn build(self) -> Result<NewTechnologyType, DomoError> {
        let technology_type = NewTechnologyType {
            kind: self.kind.unwrap_or_default(),
            language: self.language.unwrap_or_default(),
            path: self.path.unwrap_or_default(),
        };
        technology_type.validate()?;
        Ok(technology_type)
    }
}

/// Attribute filter for technology-type queries; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct TechnologyTypeFilter {
    pub kind: Option<String>,
    pub language: Option<String>,
}

impl TechnologyTypeFilter {
    /// Whether `technology_type` satisfies every set field of this filter.
    #[must_use]
    pub fn matches(&self, technology_type: &TechnologyType) -> bool {
        self.kind
            .as_ref()
            .is_none_or(|v| *v == technology_type.kind)
            && self
                .language
                .as_ref()
                .is_none_or(|v| *v == technology_type.language)
    }
}
