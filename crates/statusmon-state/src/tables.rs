//! redb table definitions for the status store.

use redb::TableDefinition;

/// Last confirmed status keyed by service name. Values are `b"UP"` or
/// `b"DOWN"`.
pub const STATUSES: TableDefinition<&str, &[u8]> = TableDefinition::new("statuses");
