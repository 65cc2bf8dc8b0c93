// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document visibility by profile.

use crate::models::{Document, Profile};

/// Whether `profile` may see `document`.
///
/// Administrators see everything. Everyone else sees ungrouped documents
/// plus those tagged with their own group.
pub fn is_visible(document: &Document, profile: &Profile) -> bool {
    if profile.is_admin() {
        return true;
    }
    match (&document.group_id, &profile.group_id) {
        (None, _) => true,
        (Some(doc_group), Some(own_group)) => doc_group == own_group,
        (Some(_), None) => false,
    }
}

/// Keep the documents visible to `profile`, preserving input order.
pub fn scope(documents: Vec<Document>, profile: &Profile) -> Vec<Document> {
    if profile.is_admin() {
        return documents;
    }
    documents
        .into_iter()
        .filter(|d| is_visible(d, profile))
        .collect()
}
