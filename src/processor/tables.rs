use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::Trim;
use thiserror::Error;

/// Status value marking a partner master entry as retired.
pub const INACTIVE_STATUS: &str = "使用しない";

/// Zero-based index of the status column (column Q) in the partner master.
const STATUS_COLUMN: usize = 16;

/// Raw department name -> canonical department name.
#[derive(Debug, Default)]
pub struct DepartmentMap(HashMap<String, String>);

impl DepartmentMap {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        Self::from_reader(open(path)?).map_err(|err| err.at(path))
    }

    pub fn from_reader(reader: impl io::Read) -> Result<Self, TableError> {
        Ok(Self::new(read_mapping(reader)?))
    }

    pub fn get(&self, raw: &str) -> Option<&str> {
        self.0.get(raw).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Hand-maintained counterparty list, consulted before anything else.
#[derive(Debug, Default)]
pub struct PartnerFixedList(HashMap<String, String>);

impl PartnerFixedList {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        Self::from_reader(open(path)?).map_err(|err| err.at(path))
    }

    pub fn from_reader(reader: impl io::Read) -> Result<Self, TableError> {
        Ok(Self::new(read_mapping(reader)?))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DynamicPartner {
    pub name: String,
    pub active: bool,
}

/// Counterparty master exported from the accounting service, in file order.
#[derive(Debug, Default)]
pub struct PartnerDynamicList {
    entries: Vec<DynamicPartner>,
    active_names: HashSet<String>,
}

impl PartnerDynamicList {
    pub fn new(entries: Vec<DynamicPartner>) -> Self {
        let active_names = entries
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.name.clone())
            .collect();

        Self {
            entries,
            active_names,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        Self::from_reader(open(path)?).map_err(|err| err.at(path))
    }

    /// Name in column A, status in column Q. Rows too short to have a
    /// status column count as active.
    pub fn from_reader(reader: impl io::Read) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result?;
            let name = record.get(0).unwrap_or("");
            if name.is_empty() {
                continue;
            }
            let status = record.get(STATUS_COLUMN).unwrap_or("");
            entries.push(DynamicPartner {
                name: name.to_string(),
                active: status != INACTIVE_STATUS,
            });
        }

        Ok(Self::new(entries))
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active_names.contains(name)
    }

    /// Active entries in their original order.
    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Every table the resolution stages read from. Built once per run and
/// only ever borrowed afterwards.
#[derive(Debug, Default)]
pub struct LookupTables {
    pub departments: DepartmentMap,
    pub partner_fixed: PartnerFixedList,
    pub partner_dynamic: PartnerDynamicList,
}

impl LookupTables {
    pub fn load(
        department_map: &Path,
        partner_list: &Path,
        partner_master: &Path,
    ) -> Result<Self, TableError> {
        let tables = Self {
            departments: DepartmentMap::from_path(department_map)?,
            partner_fixed: PartnerFixedList::from_path(partner_list)?,
            partner_dynamic: PartnerDynamicList::from_path(partner_master)?,
        };

        log::info!(
            "Loaded {} department mappings, {} fixed partners, {} partner master entries",
            tables.departments.len(),
            tables.partner_fixed.len(),
            tables.partner_dynamic.len()
        );

        Ok(tables)
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Cannot open table `{path}`: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("Malformed table: `{0}`")]
    Csv(#[from] csv::Error),
    #[error("Malformed table `{path}`: {source}")]
    CsvAt { path: PathBuf, source: csv::Error },
}

impl TableError {
    fn at(self, path: &Path) -> Self {
        match self {
            TableError::Csv(source) => TableError::CsvAt {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

fn open(path: &Path) -> Result<File, TableError> {
    File::open(path).map_err(|source| TableError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Two-column mapping with a header row. Rows with a blank cell are skipped.
fn read_mapping(reader: impl io::Read) -> Result<HashMap<String, String>, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut mapping = HashMap::new();
    for result in reader.records() {
        let record = result?;
        let raw = record.get(0).unwrap_or("");
        let canonical = record.get(1).unwrap_or("");
        if raw.is_empty() || canonical.is_empty() {
            continue;
        }
        mapping.insert(raw.to_string(), canonical.to_string());
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{DepartmentMap, PartnerDynamicList, PartnerFixedList, TableError};

    #[test]
    fn test_department_map_from_reader() {
        let input = "元の名称,正式名称\nセンター,泉佐野センターホテル\n三国, リコホテル三国 \n,空\n";
        let map = DepartmentMap::from_reader(input.as_bytes()).unwrap();

        assert_eq!(2, map.len());
        assert_eq!(Some("泉佐野センターホテル"), map.get("センター"));
        assert_eq!(Some("リコホテル三国"), map.get("三国"));
        assert_eq!(None, map.get(""));
    }

    #[test]
    fn test_partner_fixed_list_is_exact() {
        let list = PartnerFixedList::from_reader("a,b\nＡｃｍｅ,Acme\n".as_bytes()).unwrap();
        assert!(list.contains("Ａｃｍｅ"));
        assert!(!list.contains("Acme"));
    }

    #[test]
    fn test_partner_master_status_column() {
        let padding = ",".repeat(15);
        let input = format!(
            "取引先名{padding},ステータス\n\
             Acme Corp{padding},使用\n\
             Old Trading{padding},使用しない\n\
             Short Row\n"
        );

        let list = PartnerDynamicList::from_reader(input.as_bytes()).unwrap();
        assert_eq!(3, list.len());
        assert!(list.is_active("Acme Corp"));
        assert!(!list.is_active("Old Trading"));
        assert!(list.is_active("Short Row"));
        assert_eq!(vec!["Acme Corp", "Short Row"], list.active().collect::<Vec<_>>());
    }

    #[test]
    fn test_missing_table_file() {
        let result = DepartmentMap::from_path(Path::new("/nonexistent/dept.csv"));
        assert!(matches!(result, Err(TableError::Open { .. })));
    }
}
