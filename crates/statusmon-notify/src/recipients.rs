//! Recipient list merging.

use std::collections::BTreeSet;

/// Union of the service-specific and global recipients. The result is a set,
/// so an address listed in both receives a single message.
pub fn merge_recipients(service: &BTreeSet<String>, global: &BTreeSet<String>) -> BTreeSet<String> {
    service.union(global).cloned().collect()
}
