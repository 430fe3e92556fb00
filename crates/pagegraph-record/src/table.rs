//! Table kinds
//!
//! Every record the service returns belongs to exactly one table. The set is
//! closed, so it is modelled as a plain enum.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Table a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Activity,
    Block,
    Space,
    NotionUser,
    UserRoot,
    UserSetting,
    Collection,
    CollectionView,
    Comment,
    Discussion,
}

impl Table {
    /// All tables, in wire order
    pub const ALL: [Table; 10] = [
        Table::Activity,
        Table::Block,
        Table::Space,
        Table::NotionUser,
        Table::UserRoot,
        Table::UserSetting,
        Table::Collection,
        Table::CollectionView,
        Table::Comment,
        Table::Discussion,
    ];

    /// Order in which tables are parsed
    ///
    /// Collection views come before collections and discussions before
    /// comments; later tables may lean on earlier ones being decoded.
    pub const PARSE_ORDER: [Table; 10] = [
        Table::Activity,
        Table::Block,
        Table::Space,
        Table::NotionUser,
        Table::UserRoot,
        Table::UserSetting,
        Table::CollectionView,
        Table::Collection,
        Table::Discussion,
        Table::Comment,
    ];

    /// Wire name of the table
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Table::Activity => "activity",
            Table::Block => "block",
            Table::Space => "space",
            Table::NotionUser => "notion_user",
            Table::UserRoot => "user_root",
            Table::UserSetting => "user_setting",
            Table::Collection => "collection",
            Table::CollectionView => "collection_view",
            Table::Comment => "comment",
            Table::Discussion => "discussion",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RecordError::UnknownTable(s.to_string()))
    }
}
