//! Catalog seeding from TOML files.
//!
//! Seed files name colleges, and branches refer to colleges by name. A branch
//! with an empty `colleges` list is attached to every college in the file.
//! Seeding replaces the whole catalog.

use pathwise_core::catalog::{Branch, CatalogSnapshot, CatalogWriter, College};
use pathwise_core::error::StorageError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

const BUILTIN_SEED: &str = include_str!("../seed/catalog.toml");

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse seed data: {0}")]
    Parse(String),

    #[error("College names must be non-empty")]
    EmptyCollegeName,

    #[error("Duplicate college name: {0}")]
    DuplicateCollege(String),

    #[error("Branch '{branch}' refers to unknown college '{college}'")]
    UnknownCollege { branch: String, college: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCollege {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub ranking: Option<u32>,
    #[serde(default)]
    pub established: Option<u16>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedBranch {
    pub name: String,
    /// College names offering this branch; empty means all of them.
    #[serde(default)]
    pub colleges: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub advantages: Vec<String>,
    #[serde(default)]
    pub career_prospects: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub average_salary: f64,
    #[serde(default)]
    pub course_duration: Option<u8>,
    #[serde(default)]
    pub eligibility_criteria: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub colleges: Vec<SeedCollege>,
    #[serde(default)]
    pub branches: Vec<SeedBranch>,
}

impl CatalogSeed {
    /// The starter catalog shipped with the binary.
    pub fn builtin() -> Result<Self, SeedError> {
        Self::from_toml_str(BUILTIN_SEED)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SeedError> {
        toml::from_str(content).map_err(|e| SeedError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let content = std::fs::read_to_string(path).map_err(|e| SeedError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Assign IDs and resolve branch → college references by name.
    pub fn into_snapshot(self) -> Result<CatalogSnapshot, SeedError> {
        let mut seen = HashSet::new();
        let mut colleges = Vec::with_capacity(self.colleges.len());
        for seed in self.colleges {
            if seed.name.trim().is_empty() {
                return Err(SeedError::EmptyCollegeName);
            }
            if !seen.insert(seed.name.clone()) {
                return Err(SeedError::DuplicateCollege(seed.name));
            }
            let mut college = College::new(seed.name, seed.location);
            college.ranking = seed.ranking;
            college.established = seed.established;
            college.website = seed.website;
            colleges.push(college);
        }

        let mut branches = Vec::new();
        for seed in self.branches {
            let owners: Vec<&College> = if seed.colleges.is_empty() {
                colleges.iter().collect()
            } else {
                seed.colleges
                    .iter()
                    .map(|name| {
                        colleges.iter().find(|c| &c.name == name).ok_or_else(|| {
                            SeedError::UnknownCollege {
                                branch: seed.name.clone(),
                                college: name.clone(),
                            }
                        })
                    })
                    .collect::<Result<_, _>>()?
            };

            for owner in owners {
                let mut branch = Branch::new(&seed.name, &owner.id, &seed.description);
                branch.risks = seed.risks.clone();
                branch.advantages = seed.advantages.clone();
                branch.career_prospects = seed.career_prospects.clone();
                branch.required_skills = seed.required_skills.clone();
                branch.average_salary = seed.average_salary;
                if let Some(years) = seed.course_duration {
                    branch.course_duration = years;
                }
                branch.eligibility_criteria = seed.eligibility_criteria.clone();
                branches.push(branch);
            }
        }

        Ok(CatalogSnapshot::new(colleges, branches))
    }

    /// Replace the store's catalog with this seed.
    pub async fn apply(self, writer: &dyn CatalogWriter) -> Result<CatalogSnapshot, SeedError> {
        let snapshot = self.into_snapshot()?;
        writer.replace_catalog(snapshot.clone()).await?;
        info!(
            colleges = snapshot.colleges.len(),
            branches = snapshot.branches.len(),
            "Catalog seeded"
        );
        Ok(snapshot)
    }
}
