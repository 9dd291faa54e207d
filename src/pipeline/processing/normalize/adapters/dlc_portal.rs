use super::base::{AdapterUtils, RowRejection, SourceAdapter};
use crate::constants::DLC_PORTAL_SOURCE;
use crate::domain::{IntermediateRecord, RawRow};

/// Column positions in a state DLC Portal export
mod col {
    pub const PPO: usize = 1;
    pub const YEAR_OF_BIRTH: usize = 2;
    pub const PSA: usize = 3;
    pub const BANK: usize = 4;
    pub const BRANCH_ADDRESS: usize = 5;
    pub const BRANCH_PINCODE: usize = 6;
    pub const ADDRESS: usize = 7;
    pub const PINCODE: usize = 8;
    pub const STATE: usize = 9;
    pub const DISTRICT: usize = 10;
}

/// Adapter for state government DLC Portal exports.
/// Column 0 is a serial number and is ignored; the portal supplies the state.
pub struct DlcPortalAdapter;

impl DlcPortalAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DlcPortalAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAdapter for DlcPortalAdapter {
    fn extract(&self, row: &RawRow) -> Result<IntermediateRecord, RowRejection> {
        let mut record = IntermediateRecord::new(AdapterUtils::ppo(row, col::PPO)?);

        record.year_of_birth = AdapterUtils::text(row, col::YEAR_OF_BIRTH);
        record.pension_sanctioning_authority = AdapterUtils::text(row, col::PSA);
        record.psa_district = record
            .pension_sanctioning_authority
            .as_deref()
            .and_then(AdapterUtils::district_from_psa);
        record.bank_name = AdapterUtils::text(row, col::BANK);
        record.disbursing_branch_address = AdapterUtils::text(row, col::BRANCH_ADDRESS);
        record.disbursing_branch_pincode = AdapterUtils::pincode(row, col::BRANCH_PINCODE);
        record.pensioner_postal_address = AdapterUtils::text(row, col::ADDRESS);
        record.pensioner_pincode = AdapterUtils::pincode(row, col::PINCODE);
        record.state = AdapterUtils::text(row, col::STATE).map(|s| s.to_uppercase());
        record.district = AdapterUtils::text(row, col::DISTRICT);

        Ok(record)
    }

    fn source_id(&self) -> &str {
        DLC_PORTAL_SOURCE
    }

    fn name(&self) -> &str {
        "DLC Portal Adapter"
    }
}
