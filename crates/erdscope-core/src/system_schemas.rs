//! Built-in schemas of each supported database
//!
//! These schemas hold catalog tables and are hidden from schema pickers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Databases the explorer knows how to present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    PostgreSql,
    MySql,
    Sqlite,
    SqlServer,
    Oracle,
    DuckDb,
}

impl DatabaseType {
    /// Parse a host database name; unsupported databases yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Some(Self::PostgreSql),
            "mysql" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            "sqlserver" | "mssql" => Some(Self::SqlServer),
            "oracle" => Some(Self::Oracle),
            "duckdb" => Some(Self::DuckDb),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlserver",
            Self::Oracle => "oracle",
            Self::DuckDb => "duckdb",
        }
    }

    /// Exact names of this database's system schemas
    pub fn system_schema_names(&self) -> &'static [&'static str] {
        match self {
            Self::PostgreSql => &["pg_catalog", "information_schema"],
            Self::MySql | Self::Sqlite => &[],
            Self::SqlServer => &["sys", "INFORMATION_SCHEMA"],
            Self::Oracle => &[
                "SYS",
                "SYSTEM",
                "OUTLN",
                "XDB",
                "MDSYS",
                "CTXSYS",
                "ORDSYS",
                "WMSYS",
                "DBSNMP",
                "APPQOSSYS",
            ],
            Self::DuckDb => &["information_schema", "pg_catalog", "duckdb_catalog"],
        }
    }

    fn system_schema_patterns(&self) -> &'static [Regex] {
        match self {
            Self::PostgreSql => POSTGRES_PATTERNS.as_slice(),
            _ => &[],
        }
    }
}

static POSTGRES_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["^pg_toast", "^pg_temp_", "^pg_internal"]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// Check whether `schema` is one of the database's own schemas
pub fn is_system_schema(database: DatabaseType, schema: &str) -> bool {
    database.system_schema_names().contains(&schema)
        || database
            .system_schema_patterns()
            .iter()
            .any(|pattern| pattern.is_match(schema))
}
