//! Catalog domain: colleges and academic branches.
//!
//! The catalog is read-only from the assistant's point of view. It is loaded
//! as a [`CatalogSnapshot`] on every turn and scanned for entity names.
//!
//! A college's list of branch names is never stored on the college itself;
//! it is always derived from the branches that reference it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, StorageError};

/// A college in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct College {
    pub id: String,

    /// Unique, non-empty display name
    pub name: String,

    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub established: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl College {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            location: location.into(),
            ranking: None,
            established: None,
            website: None,
        }
    }

    pub fn with_ranking(mut self, ranking: u32) -> Self {
        self.ranking = Some(ranking);
        self
    }
}

fn default_course_duration() -> u8 {
    4
}

/// An academic branch offered by a college.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,

    pub name: String,

    /// ID of the owning [`College`]. May dangle; see [`CatalogSnapshot`].
    pub college_id: String,

    pub description: String,

    #[serde(default)]
    pub risks: Vec<String>,

    #[serde(default)]
    pub advantages: Vec<String>,

    #[serde(default)]
    pub career_prospects: Vec<String>,

    /// Skills a student needs. Empty when the catalog has no data.
    #[serde(default)]
    pub required_skills: Vec<String>,

    /// Currency-agnostic average salary
    #[serde(default)]
    pub average_salary: f64,

    /// Course duration in years
    #[serde(default = "default_course_duration")]
    pub course_duration: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility_criteria: Option<String>,
}

impl Branch {
    pub fn new(
        name: impl Into<String>,
        college_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            college_id: college_id.into(),
            description: description.into(),
            risks: Vec::new(),
            advantages: Vec::new(),
            career_prospects: Vec::new(),
            required_skills: Vec::new(),
            average_salary: 0.0,
            course_duration: default_course_duration(),
            eligibility_criteria: None,
        }
    }
}

/// A point-in-time view of the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub colleges: Vec<College>,
    pub branches: Vec<Branch>,
}

impl CatalogSnapshot {
    pub fn new(colleges: Vec<College>, branches: Vec<Branch>) -> Self {
        Self { colleges, branches }
    }

    pub fn college(&self, id: &str) -> Option<&College> {
        self.colleges.iter().find(|c| c.id == id)
    }

    /// Names of the branches referencing `college_id`, in catalog order.
    pub fn branch_names_for(&self, college_id: &str) -> Vec<String> {
        self.branches
            .iter()
            .filter(|b| b.college_id == college_id)
            .map(|b| b.name.clone())
            .collect()
    }

    /// Branches whose college reference does not resolve.
    pub fn dangling_branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches
            .iter()
            .filter(|b| self.college(&b.college_id).is_none())
    }

    pub fn is_empty(&self) -> bool {
        self.colleges.is_empty() && self.branches.is_empty()
    }
}

/// Read access to the catalog store.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    async fn list_colleges(&self) -> Result<Vec<College>, CatalogError>;

    async fn list_branches(&self) -> Result<Vec<Branch>, CatalogError>;

    /// Load colleges and branches together.
    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let colleges = self.list_colleges().await?;
        let branches = self.list_branches().await?;
        Ok(CatalogSnapshot { colleges, branches })
    }

    async fn get_branch(&self, id: &str) -> Result<Option<Branch>, CatalogError> {
        Ok(self.list_branches().await?.into_iter().find(|b| b.id == id))
    }

    /// Can the store be reached?
    async fn health_check(&self) -> bool {
        self.list_colleges().await.is_ok()
    }
}

/// Administrative write access, used only for seeding.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Replace every college and branch with the given set.
    async fn replace_catalog(&self, snapshot: CatalogSnapshot) -> Result<(), StorageError>;
}
