//! Migration unit discovery and SQL file parsing.

use std::path::{Path, PathBuf};

use crate::error::{MigrationError, Result};

/// The parsed body of a migration unit, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitBody {
    /// Statement blocks parsed from a `.sql` file's `-- +migrate Up` /
    /// `-- +migrate Down` sections. Either may be empty.
    Sql { up: String, down: String },
    /// A file whose extension is not `.sql`. Its `up`/`down` behavior comes
    /// from a process-local registration under the same id.
    Programmatic,
}

/// One migration unit discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    pub id: String,
    pub description: String,
    pub path: PathBuf,
    pub body: UnitBody,
}

const UP_MARKER: &str = "-- +migrate Up";
const DOWN_MARKER: &str = "-- +migrate Down";

/// Splits a migration file name into `(id, description, extension)`.
/// Returns `None` if the name has no `_` separator or no extension.
fn split_file_name(name: &str) -> Option<(&str, &str, &str)> {
    let (stem, ext) = name.rsplit_once('.')?;
    let (id, description) = stem.split_once('_')?;
    if id.is_empty() || description.is_empty() {
        return None;
    }
    Some((id, description, ext))
}

/// Parses a `.sql` migration file's content into its up/down sections.
/// Blank lines and `--`-prefixed comments outside a section are ignored;
/// content before the first marker is discarded.
fn parse_sql_sections(content: &str) -> (String, String) {
    enum Section {
        None,
        Up,
        Down,
    }

    let mut current = Section::None;
    let mut up = String::new();
    let mut down = String::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == UP_MARKER {
            current = Section::Up;
            continue;
        }
        if trimmed == DOWN_MARKER {
            current = Section::Down;
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        match current {
            Section::None => continue,
            Section::Up => {
                up.push_str(line);
                up.push('\n');
            }
            Section::Down => {
                down.push_str(line);
                down.push('\n');
            }
        }
    }

    (up.trim().to_string(), down.trim().to_string())
}

/// Loads a single migration unit from `path`.
pub fn load_unit(path: &Path) -> Result<MigrationUnit> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| MigrationError::MalformedFileName(path.display().to_string()))?;
    let (id, description, ext) = split_file_name(name)
        .ok_or_else(|| MigrationError::MalformedFileName(name.to_string()))?;

    let body = if ext.eq_ignore_ascii_case("sql") {
        let content = std::fs::read_to_string(path).map_err(|source| MigrationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let (up, down) = parse_sql_sections(&content);
        UnitBody::Sql { up, down }
    } else {
        UnitBody::Programmatic
    };

    Ok(MigrationUnit {
        id: id.to_string(),
        description: description.to_string(),
        path: path.to_path_buf(),
        body,
    })
}

/// Discovers all migration units in `dir`, sorted ascending by id.
/// `dir` not existing yields an empty list, matching a freshly initialized
/// project that hasn't created its first migration yet.
pub fn discover_units(dir: &Path) -> Result<Vec<MigrationUnit>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|source| MigrationError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut units = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| MigrationError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        units.push(load_unit(&path)?);
    }
    units.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_well_formed_names() {
        assert_eq!(
            split_file_name("20240101000000_add_users.sql"),
            Some(("20240101000000", "add_users", "sql"))
        );
    }

    #[test]
    fn rejects_names_without_separator_or_extension() {
        assert_eq!(split_file_name("addusers.sql"), None);
        assert_eq!(split_file_name("20240101000000_add_users"), None);
    }

    #[test]
    fn parses_up_and_down_sections() {
        let content = "\
-- +migrate Up
CREATE TABLE widgets (id INTEGER PRIMARY KEY);

-- comment ignored
-- +migrate Down
DROP TABLE widgets;
";
        let (up, down) = parse_sql_sections(content);
        assert_eq!(up, "CREATE TABLE widgets (id INTEGER PRIMARY KEY);");
        assert_eq!(down, "DROP TABLE widgets;");
    }

    #[test]
    fn empty_sections_are_legal() {
        let content = "-- +migrate Up\n-- +migrate Down\n";
        let (up, down) = parse_sql_sections(content);
        assert_eq!(up, "");
        assert_eq!(down, "");
    }

    #[test]
    fn discover_units_sorts_ascending() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("20240201000000_b.sql"),
            "-- +migrate Up\nSELECT 1;\n-- +migrate Down\nSELECT 2;\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("20240101000000_a.sql"),
            "-- +migrate Up\nSELECT 1;\n-- +migrate Down\nSELECT 2;\n",
        )
        .unwrap();

        let units = discover_units(dir.path()).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].id, "20240101000000");
        assert_eq!(units[1].id, "20240201000000");
    }

    #[test]
    fn missing_directory_yields_empty_list() {
        let units = discover_units(Path::new("/nonexistent/path/for/orm-migrate")).unwrap();
        assert!(units.is_empty());
    }
}
