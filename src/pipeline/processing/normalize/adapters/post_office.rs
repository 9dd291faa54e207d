use super::base::{AdapterUtils, RowRejection, SourceAdapter};
use crate::constants::{DOP_BANK_NAME, DOP_SOURCE};
use crate::domain::{IntermediateRecord, RawRow};

mod col {
    pub const PPO: usize = 0;
    pub const YEAR_OF_BIRTH: usize = 1;
    pub const HEAD_OFFICE: usize = 2;
    pub const ADDRESS: usize = 3;
    pub const PINCODE: usize = 4;
}

/// Adapter for the Department of Posts export.
/// Pensions are paid through the head post office that sanctioned them, so
/// the PSA doubles as the disbursing branch.
pub struct PostOfficeAdapter;

impl PostOfficeAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostOfficeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAdapter for PostOfficeAdapter {
    fn extract(&self, row: &RawRow) -> Result<IntermediateRecord, RowRejection> {
        let mut record = IntermediateRecord::new(AdapterUtils::ppo(row, col::PPO)?);

        record.year_of_birth = AdapterUtils::text(row, col::YEAR_OF_BIRTH);
        record.pension_sanctioning_authority = AdapterUtils::text(row, col::HEAD_OFFICE);
        record.psa_district = record
            .pension_sanctioning_authority
            .as_deref()
            .and_then(AdapterUtils::district_from_psa);
        record.bank_name = Some(DOP_BANK_NAME.to_string());
        record.disbursing_branch_address = record.pension_sanctioning_authority.clone();
        record.pensioner_postal_address = AdapterUtils::text(row, col::ADDRESS);
        record.pensioner_pincode = AdapterUtils::pincode(row, col::PINCODE);
        record.district = record.psa_district.clone();

        Ok(record)
    }

    fn source_id(&self) -> &str {
        DOP_SOURCE
    }

    fn name(&self) -> &str {
        "Department of Posts Adapter"
    }
}
