//! Per-table parsers
//!
//! Each table has its own schema and its own decoding function. The
//! functions live in a [`ParserRegistry`] keyed by [`Table`]; the output is a
//! [`TypedValue`], one variant per table.
//!
//! Decoding is a pure function of the raw payload, so parsing the same
//! payload twice always yields equal values.

use crate::error::RecordError;
use crate::id::RecordId;
use crate::table::Table;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

mod activity;
mod block;
mod collection;
mod discussion;
mod space;
mod user;

pub use activity::Activity;
pub use block::{kind, Block};
pub use collection::{Collection, CollectionView};
pub use discussion::{Comment, Discussion};
pub use space::Space;
pub use user::{NotionUser, UserRoot, UserSetting};

/// Decoding function for one table
pub type ParseFn = fn(&Value) -> Result<TypedValue, serde_json::Error>;

/// Typed record payload, one variant per table
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Activity(Activity),
    Block(Block),
    Space(Space),
    NotionUser(NotionUser),
    UserRoot(UserRoot),
    UserSetting(UserSetting),
    Collection(Collection),
    CollectionView(CollectionView),
    Comment(Comment),
    Discussion(Discussion),
}

impl TypedValue {
    /// Table this value was decoded for
    #[must_use]
    pub fn table(&self) -> Table {
        match self {
            Self::Activity(_) => Table::Activity,
            Self::Block(_) => Table::Block,
            Self::Space(_) => Table::Space,
            Self::NotionUser(_) => Table::NotionUser,
            Self::UserRoot(_) => Table::UserRoot,
            Self::UserSetting(_) => Table::UserSetting,
            Self::Collection(_) => Table::Collection,
            Self::CollectionView(_) => Table::CollectionView,
            Self::Comment(_) => Table::Comment,
            Self::Discussion(_) => Table::Discussion,
        }
    }

    /// ID carried inside the payload
    #[must_use]
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Activity(v) => &v.id,
            Self::Block(v) => &v.id,
            Self::Space(v) => &v.id,
            Self::NotionUser(v) => &v.id,
            Self::UserRoot(v) => &v.id,
            Self::UserSetting(v) => &v.id,
            Self::Collection(v) => &v.id,
            Self::CollectionView(v) => &v.id,
            Self::Comment(v) => &v.id,
            Self::Discussion(v) => &v.id,
        }
    }
}

/// Lookup table from [`Table`] to its decoding function
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<Table, ParseFn>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        default_parsers()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tables: Vec<_> = self.parsers.keys().collect();
        tables.sort();
        f.debug_struct("ParserRegistry")
            .field("tables", &tables)
            .finish()
    }
}

impl ParserRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register (or replace) the parser for a table
    pub fn register(&mut self, table: Table, parser: ParseFn) {
        self.parsers.insert(table, parser);
    }

    /// Whether a table has a parser
    #[inline]
    #[must_use]
    pub fn contains(&self, table: Table) -> bool {
        self.parsers.contains_key(&table)
    }

    /// Decode one record's payload
    ///
    /// # Errors
    /// [`RecordError::NoParser`] if the table is unregistered,
    /// [`RecordError::Parse`] if the payload does not fit the schema.
    pub fn parse(&self, table: Table, id: &RecordId, value: &Value) -> Result<TypedValue, RecordError> {
        let parser = self.parsers.get(&table).ok_or(RecordError::NoParser(table))?;
        parser(value).map_err(|source| RecordError::parse(table, id.clone(), source))
    }
}

/// Registry with a parser for every table
#[must_use]
pub fn default_parsers() -> ParserRegistry {
    let mut registry = ParserRegistry::new();

    registry.register(Table::Activity, |v| Activity::deserialize(v).map(TypedValue::Activity));
    registry.register(Table::Block, |v| Block::deserialize(v).map(TypedValue::Block));
    registry.register(Table::Space, |v| Space::deserialize(v).map(TypedValue::Space));
    registry.register(Table::NotionUser, |v| {
        NotionUser::deserialize(v).map(TypedValue::NotionUser)
    });
    registry.register(Table::UserRoot, |v| UserRoot::deserialize(v).map(TypedValue::UserRoot));
    registry.register(Table::UserSetting, |v| {
        UserSetting::deserialize(v).map(TypedValue::UserSetting)
    });
    registry.register(Table::Collection, |v| {
        Collection::deserialize(v).map(TypedValue::Collection)
    });
    registry.register(Table::CollectionView, |v| {
        CollectionView::deserialize(v).map(TypedValue::CollectionView)
    });
    registry.register(Table::Comment, |v| Comment::deserialize(v).map(TypedValue::Comment));
    registry.register(Table::Discussion, |v| {
        Discussion::deserialize(v).map(TypedValue::Discussion)
    });

    registry
}

/// Shared default registry
#[must_use]
pub fn global() -> &'static ParserRegistry {
    static REGISTRY: OnceLock<ParserRegistry> = OnceLock::new();
    REGISTRY.get_or_init(default_parsers)
}

/// Treat an explicit `null` like a missing field
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Flatten rich text (`[["text", [formatting]], ...]`) into a plain string
#[must_use]
pub fn plain_text(spans: &Value) -> String {
    let Some(spans) = spans.as_array() else {
        return spans.as_str().unwrap_or_default().to_string();
    };
    spans
        .iter()
        .filter_map(|span| match span {
            Value::Array(parts) => parts.first().and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}
