//! Driver-type tags shared by the dialect profile, the connection registry
//! (`orm-connect`), and configuration (`orm-config`).

use std::fmt;

/// Identifies a backing store. Relational tags select a [`crate::Dialect`]
/// profile; `MongoDb` selects a document-store factory instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverTag {
    Sqlite,
    Postgres,
    MySql,
    MsSql,
    MongoDb,
}

impl DriverTag {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverTag::Sqlite => "sqlite",
            DriverTag::Postgres => "postgres",
            DriverTag::MySql => "mysql",
            DriverTag::MsSql => "mssql",
            DriverTag::MongoDb => "mongodb",
        }
    }

    pub fn is_relational(self) -> bool {
        !matches!(self, DriverTag::MongoDb)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "sqlite" => DriverTag::Sqlite,
            "postgres" | "postgresql" => DriverTag::Postgres,
            "mysql" | "mariadb" => DriverTag::MySql,
            "mssql" | "sqlserver" => DriverTag::MsSql,
            "mongodb" | "mongo" => DriverTag::MongoDb,
            _ => return None,
        })
    }
}

impl fmt::Display for DriverTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_as_str() {
        for tag in [
            DriverTag::Sqlite,
            DriverTag::Postgres,
            DriverTag::MySql,
            DriverTag::MsSql,
            DriverTag::MongoDb,
        ] {
            assert_eq!(DriverTag::parse(tag.as_str()), Some(tag));
        }
    }

    #[test]
    fn mongo_is_not_relational() {
        assert!(!DriverTag::MongoDb.is_relational());
        assert!(DriverTag::Sqlite.is_relational());
    }
}
