//! Entity matching: finds the catalog entries a query mentions.
//!
//! Matching is a case-insensitive substring test of each entity name against
//! the raw query. There is no tokenization or word-boundary check, so
//! "EE" matches inside "engineering". Results keep catalog order.

use pathwise_core::catalog::{Branch, CatalogSnapshot, College};
use serde::Serialize;
use tracing::warn;

/// A matched college together with the branch names it offers.
///
/// `branch_names` is computed from the branch records that reference the
/// college, never from a stored list on the college itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedCollege {
    pub college: College,
    pub branch_names: Vec<String>,
}

/// The subset of a catalog referenced by one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    pub colleges: Vec<MatchedCollege>,
    pub branches: Vec<Branch>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.colleges.is_empty() && self.branches.is_empty()
    }
}

/// Match `query` against every college and branch in `catalog`.
///
/// An empty query, or a query naming nothing, yields an empty result.
pub fn match_entities(query: &str, catalog: &CatalogSnapshot) -> MatchResult {
    for branch in catalog.dangling_branches() {
        warn!(
            branch = %branch.name,
            college_id = %branch.college_id,
            "Branch references a missing college; excluded from college context"
        );
    }

    let haystack = query.to_lowercase();

    let colleges = catalog
        .colleges
        .iter()
        .filter(|c| mentions(&haystack, &c.name))
        .map(|c| MatchedCollege {
            college: c.clone(),
            branch_names: catalog.branch_names_for(&c.id),
        })
        .collect();

    let branches = catalog
        .branches
        .iter()
        .filter(|b| mentions(&haystack, &b.name))
        .cloned()
        .collect();

    MatchResult { colleges, branches }
}

fn mentions(lowered_query: &str, name: &str) -> bool {
    // An empty name is a substring of everything.
    !name.is_empty() && lowered_query.contains(&name.to_lowercase())
}
