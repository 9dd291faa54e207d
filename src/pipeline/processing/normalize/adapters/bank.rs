use super::base::{AdapterUtils, RowRejection, SourceAdapter};
use crate::constants::{BANK_GENERIC_SOURCE, BANK_IOB_SOURCE, IOB_BANK_NAME};
use crate::domain::{IntermediateRecord, RawRow};

/// Where each field sits in a bank's pensioner export
#[derive(Debug, Clone, Copy)]
pub struct BankLayout {
    pub bank_name: Option<usize>,
    pub ppo: usize,
    pub date_of_birth: usize,
    pub psa: usize,
    pub psa_district: Option<usize>,
    pub branch_address: usize,
    pub branch_pincode: usize,
    pub address: usize,
    pub pincode: usize,
}

/// Indian Overseas Bank exports carry no bank column
const IOB_LAYOUT: BankLayout = BankLayout {
    bank_name: None,
    ppo: 0,
    date_of_birth: 1,
    psa: 2,
    psa_district: None,
    branch_address: 3,
    branch_pincode: 4,
    address: 5,
    pincode: 6,
};

const GENERIC_LAYOUT: BankLayout = BankLayout {
    bank_name: Some(0),
    ppo: 1,
    date_of_birth: 2,
    psa: 3,
    psa_district: Some(4),
    branch_address: 5,
    branch_pincode: 6,
    address: 7,
    pincode: 8,
};

/// Adapter for bank-supplied pensioner exports keyed by date of birth
pub struct BankExportAdapter {
    source_id: &'static str,
    name: &'static str,
    layout: BankLayout,
    default_bank: Option<&'static str>,
}

impl BankExportAdapter {
    pub fn new(
        source_id: &'static str,
        name: &'static str,
        layout: BankLayout,
        default_bank: Option<&'static str>,
    ) -> Self {
        Self {
            source_id,
            name,
            layout,
            default_bank,
        }
    }

    pub fn indian_overseas_bank() -> Self {
        Self::new(BANK_IOB_SOURCE, "Indian Overseas Bank Adapter", IOB_LAYOUT, Some(IOB_BANK_NAME))
    }

    pub fn generic() -> Self {
        Self::new(BANK_GENERIC_SOURCE, "Generic Bank Export Adapter", GENERIC_LAYOUT, None)
    }
}

impl SourceAdapter for BankExportAdapter {
    fn extract(&self, row: &RawRow) -> Result<IntermediateRecord, RowRejection> {
        let layout = &self.layout;
        let mut record = IntermediateRecord::new(AdapterUtils::ppo(row, layout.ppo)?);

        // An empty bank cell falls back to the source default, same as a missing column
        record.bank_name = layout
            .bank_name
            .and_then(|idx| AdapterUtils::text(row, idx))
            .or_else(|| self.default_bank.map(str::to_string));

        record.date_of_birth = AdapterUtils::text(row, layout.date_of_birth);
        record.pension_sanctioning_authority = AdapterUtils::text(row, layout.psa);
        record.psa_district = layout
            .psa_district
            .and_then(|idx| AdapterUtils::text(row, idx))
            .or_else(|| {
                record
                    .pension_sanctioning_authority
                    .as_deref()
                    .and_then(AdapterUtils::district_from_psa)
            });
        record.disbursing_branch_address = AdapterUtils::text(row, layout.branch_address);
        record.disbursing_branch_pincode = AdapterUtils::pincode(row, layout.branch_pincode);
        record.pensioner_postal_address = AdapterUtils::text(row, layout.address);
        record.pensioner_pincode = AdapterUtils::pincode(row, layout.pincode);

        Ok(record)
    }

    fn source_id(&self) -> &str {
        self.source_id
    }

    fn name(&self) -> &str {
        self.name
    }
}
