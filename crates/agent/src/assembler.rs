//! Prompt assembly.
//!
//! Renders matched catalog entities into a context block and wraps it, with
//! the user's query, in a fixed counselor instruction template.
//!
//! # Determinism
//!
//! Assembly is a pure function of its inputs. Nothing here reads the clock,
//! the environment, or any collaborator, so identical inputs always produce
//! byte-identical prompts.

use crate::matcher::{MatchResult, MatchedCollege};
use pathwise_core::catalog::Branch;
use std::fmt::Write;

const ROLE_LINE: &str =
    "You are a career guidance counselor helping students choose engineering branches and colleges.";
const CONTEXT_LINE: &str = "Use this context information if relevant:";
const CLOSING_LINE: &str =
    "Provide a helpful, informative response focusing on career guidance.";

/// Build the full prompt for one query.
pub fn assemble(query: &str, matched: &MatchResult) -> String {
    let context = render_context(matched);
    format!("{ROLE_LINE}\n{CONTEXT_LINE}\n{context}\nStudent Query: {query}\n\n{CLOSING_LINE}")
}

/// Render the context block: colleges first, then branches, each block
/// terminated by a blank line. Empty when nothing matched.
pub fn render_context(matched: &MatchResult) -> String {
    let mut out = String::new();
    for college in &matched.colleges {
        render_college(&mut out, college);
    }
    for branch in &matched.branches {
        render_branch(&mut out, branch);
    }
    out
}

fn render_college(out: &mut String, matched: &MatchedCollege) {
    let college = &matched.college;
    let ranking = college
        .ranking
        .map_or_else(|| "not ranked".to_string(), |r| r.to_string());

    // Writing to a String cannot fail.
    let _ = write!(
        out,
        "Information about {}:\nLocation: {}\nRanking: {}\nAvailable Branches: {}\n\n",
        college.name,
        college.location,
        ranking,
        matched.branch_names.join(", "),
    );
}

fn render_branch(out: &mut String, branch: &Branch) {
    let _ = write!(
        out,
        "Information about {}:\nDescription: {}\nCareer Prospects: {}\n",
        branch.name,
        branch.description,
        branch.career_prospects.join(", "),
    );
    if !branch.required_skills.is_empty() {
        let _ = writeln!(out, "Required Skills: {}", branch.required_skills.join(", "));
    }
    out.push('\n');
}
