//! Typed references to external CRM entities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use dochub_core::error::AppError;
use dochub_core::types::ExternalId;

use super::label::LabelColumn;

/// Kinds of CRM records a document version can be linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// A company record.
    Company,
    /// A person at a company.
    Contact,
    /// A job posting being tracked.
    Job,
    /// A prospective company, contact, or job (see [`LeadSubtype`]).
    Lead,
    /// A follow-up task.
    Task,
}

impl EntityKind {
    /// Every kind, used to build capability tables.
    pub const ALL: [EntityKind; 5] = [
        Self::Company,
        Self::Contact,
        Self::Job,
        Self::Lead,
        Self::Task,
    ];

    /// Type tag stored in association tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "Company",
            Self::Contact => "Contact",
            Self::Job => "Job",
            Self::Lead => "Lead",
            Self::Task => "Task",
        }
    }

    /// Where labels for this kind come from, in lookup priority order.
    pub fn label_sources(&self) -> Vec<LabelColumn> {
        match self {
            Self::Company => vec![LabelColumn::new("companies", "name")],
            Self::Contact => vec![LabelColumn::new("contacts", "full_name")],
            Self::Job => vec![LabelColumn::new("jobs", "title")],
            Self::Task => vec![LabelColumn::new("tasks", "title")],
            Self::Lead => LeadSubtype::ALL
                .iter()
                .map(LeadSubtype::label_column)
                .collect(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "company" => Ok(Self::Company),
            "contact" => Ok(Self::Contact),
            "job" => Ok(Self::Job),
            "lead" => Ok(Self::Lead),
            "task" => Ok(Self::Task),
            _ => Err(AppError::validation(format!("Invalid entity type: '{s}'"))),
        }
    }
}

/// The disjoint tables that together realize the `Lead` supertype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadSubtype {
    /// A company the user may apply to.
    CompanyLead,
    /// A person the user may reach out to.
    ContactLead,
    /// A posting the user may apply for.
    JobLead,
}

impl LeadSubtype {
    /// Every subtype, in label lookup priority order.
    pub const ALL: [LeadSubtype; 3] = [Self::CompanyLead, Self::ContactLead, Self::JobLead];

    /// Subtype name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyLead => "CompanyLead",
            Self::ContactLead => "ContactLead",
            Self::JobLead => "JobLead",
        }
    }

    /// Table and column holding this subtype's label.
    pub fn label_column(&self) -> LabelColumn {
        match self {
            Self::CompanyLead => LabelColumn::new("company_leads", "company_name"),
            Self::ContactLead => LabelColumn::new("contact_leads", "full_name"),
            Self::JobLead => LabelColumn::new("job_leads", "title"),
        }
    }
}

/// A typed `(kind, id)` reference to an external entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity id within its kind.
    pub id: ExternalId,
}

impl EntityRef {
    /// Create a reference.
    pub fn new(kind: EntityKind, id: ExternalId) -> Self {
        Self { kind, id }
    }

    /// Label used when no backing row has one.
    pub fn fallback_label(&self) -> String {
        format!("{} #{}", self.kind, self.id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for EntityRef {
    type Err = AppError;

    /// Parses `Kind:id`, e.g. `Lead:42`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| AppError::validation(format!("Expected 'Kind:id', got '{s}'")))?;
        let id = id
            .trim()
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid entity id in '{s}'")))?;
        Ok(Self::new(kind.trim().parse()?, id))
    }
}
