use chrono::NaiveDate;

use crate::model::AccountingRecord;
use crate::processor::{
    codes::{Channel, CodeTables, CodesError},
    department::DepartmentNormalizer,
    partner::PartnerResolver,
    tables::LookupTables,
    voucher::{MonthSource, VoucherEncoder},
};

pub mod codes;
pub mod department;
pub mod partner;
pub mod similarity;
pub mod tables;
pub mod voucher;

/// Resolution stages applied to every record of a file, in order:
/// departments, counterparties, voucher numbers. Stages only refine
/// records and append errors; they never drop a record.
pub struct Pipeline<'a> {
    departments: DepartmentNormalizer<'a>,
    partners: PartnerResolver<'a>,
    vouchers: VoucherEncoder<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        tables: &'a LookupTables,
        codes: &'a CodeTables,
        channel: Channel,
        month_source: MonthSource,
        run_date: NaiveDate,
    ) -> Result<Self, CodesError> {
        Ok(Self {
            departments: DepartmentNormalizer::new(&tables.departments),
            partners: PartnerResolver::new(&tables.partner_fixed, &tables.partner_dynamic),
            vouchers: VoucherEncoder::new(codes, channel, month_source, run_date)?,
        })
    }

    pub fn run(&self, records: &mut [AccountingRecord]) {
        self.departments.normalize(records);
        self.partners.resolve_all(records);
        self.vouchers.encode_all(records);
    }
}
