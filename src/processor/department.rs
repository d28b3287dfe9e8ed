use crate::model::{AccountingRecord, Side};

use super::tables::DepartmentMap;

/// Department assumed when no row of a file names one.
pub const HEAD_OFFICE: &str = "本部";

/// Prefix marking a department that is missing from the mapping.
pub const UNREGISTERED_PREFIX: &str = "UNREGISTERED_";

pub struct DepartmentNormalizer<'a> {
    departments: &'a DepartmentMap,
}

impl<'a> DepartmentNormalizer<'a> {
    pub fn new(departments: &'a DepartmentMap) -> Self {
        Self { departments }
    }

    /// Rewrites both department fields of every record to their canonical
    /// name. Blank fields take the file's default department.
    pub fn normalize(&self, records: &mut [AccountingRecord]) {
        let default = self.default_department(records);
        log::debug!("Default department for batch: {}", default);

        for record in records.iter_mut() {
            for side in Side::BOTH {
                let raw = record.side(side).department.trim().to_string();
                let normalized = if raw.is_empty() {
                    default.clone()
                } else if let Some(canonical) = self.departments.get(&raw) {
                    canonical.to_string()
                } else {
                    record.add_error(format!("{side} department not registered: {raw}"));
                    format!("{UNREGISTERED_PREFIX}{raw}")
                };
                record.side_mut(side).department = normalized;
            }
        }
    }

    /// The whole file is assumed to belong to one department: the first one
    /// named, debit side before credit side.
    fn default_department(&self, records: &[AccountingRecord]) -> String {
        records
            .iter()
            .flat_map(|record| Side::BOTH.map(move |side| record.side(side).department.trim()))
            .find(|department| !department.is_empty())
            .map(|raw| self.departments.get(raw).unwrap_or(raw).to_string())
            .unwrap_or_else(|| HEAD_OFFICE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{DepartmentNormalizer, HEAD_OFFICE};
    use crate::model::AccountingRecord;
    use crate::processor::tables::DepartmentMap;

    fn departments() -> DepartmentMap {
        DepartmentMap::new(HashMap::from([
            ("センター".to_string(), "泉佐野センターホテル".to_string()),
            ("三国".to_string(), "リコホテル三国".to_string()),
        ]))
    }

    fn record(debit: &str, credit: &str) -> AccountingRecord {
        let mut record = AccountingRecord::new(2);
        record.debit.department = debit.to_string();
        record.credit.department = credit.to_string();
        record
    }

    #[test]
    fn test_blank_departments_take_first_named() {
        let departments = departments();
        let mut records = vec![record("", ""), record("", "三国"), record("センター", "")];

        DepartmentNormalizer::new(&departments).normalize(&mut records);

        assert_eq!("リコホテル三国", records[0].debit.department);
        assert_eq!("リコホテル三国", records[0].credit.department);
        assert_eq!("リコホテル三国", records[1].debit.department);
        assert_eq!("泉佐野センターホテル", records[2].debit.department);
        assert_eq!("リコホテル三国", records[2].credit.department);
        assert!(records.iter().all(|record| record.errors.is_empty()));
    }

    #[test]
    fn test_debit_side_wins_default() {
        let departments = departments();
        let mut records = vec![record("センター", "三国"), record("", "")];

        DepartmentNormalizer::new(&departments).normalize(&mut records);

        assert_eq!("泉佐野センターホテル", records[1].debit.department);
    }

    #[test]
    fn test_no_department_falls_back_to_head_office() {
        let departments = departments();
        let mut records = vec![record("", ""), record(" ", "")];

        DepartmentNormalizer::new(&departments).normalize(&mut records);

        for record in &records {
            assert_eq!(HEAD_OFFICE, record.debit.department);
            assert_eq!(HEAD_OFFICE, record.credit.department);
        }
    }

    #[test]
    fn test_unregistered_department_is_flagged() {
        let departments = departments();
        let mut records = vec![record("Branch-X", "")];

        DepartmentNormalizer::new(&departments).normalize(&mut records);

        assert_eq!("UNREGISTERED_Branch-X", records[0].debit.department);
        // the default comes from the raw name, which is not flagged again
        assert_eq!("Branch-X", records[0].credit.department);
        assert_eq!(1, records[0].errors.len());
        assert!(records[0].errors[0].contains("Branch-X"));
    }

    #[test]
    fn test_errors_are_appended() {
        let departments = departments();
        let mut records = vec![record("Nowhere", "Elsewhere")];
        records[0].add_error("row 2: date is blank");

        DepartmentNormalizer::new(&departments).normalize(&mut records);

        assert_eq!(
            vec![
                "row 2: date is blank".to_string(),
                "debit department not registered: Nowhere".to_string(),
                "credit department not registered: Elsewhere".to_string(),
            ],
            records[0].errors
        );
    }
}
