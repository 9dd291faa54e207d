pub mod adapters;
pub mod registry;

use crate::constants::MAX_ADDRESS_LEN;
use crate::domain::{CanonicalRecord, IntermediateRecord};
use crate::pipeline::processing::age::AgeDeriver;
use crate::pipeline::processing::geography::GeographyResolver;

pub use adapters::{RowRejection, SourceAdapter};
pub use registry::AdapterRegistry;

/// Turns adapter output into canonical records, deriving state and age
#[derive(Debug, Clone)]
pub struct CanonicalRecordBuilder {
    geography: GeographyResolver,
    ages: AgeDeriver,
}

impl CanonicalRecordBuilder {
    pub fn new(geography: GeographyResolver, ages: AgeDeriver) -> Self {
        Self { geography, ages }
    }

    pub fn geography(&self) -> &GeographyResolver {
        &self.geography
    }

    pub fn build(&self, intermediate: IntermediateRecord, data_source: &str) -> CanonicalRecord {
        let IntermediateRecord {
            ppo_number,
            year_of_birth,
            date_of_birth,
            pension_sanctioning_authority,
            psa_district,
            bank_name,
            disbursing_branch_address,
            disbursing_branch_pincode,
            pensioner_postal_address,
            pensioner_pincode,
            state,
            district,
        } = intermediate;

        // The pensioner's own pincode decides the state, never the branch's
        let state = match state {
            Some(s) if !s.trim().is_empty() => s,
            _ => self.geography.resolve_state(pensioner_pincode.as_deref()),
        };

        let (age, age_category) = self
            .ages
            .derive(year_of_birth.as_deref(), date_of_birth.as_deref());

        CanonicalRecord {
            ppo_number: ppo_number.trim().to_string(),
            year_of_birth,
            date_of_birth,
            age,
            age_category,
            pension_sanctioning_authority,
            district: district.or_else(|| psa_district.clone()),
            psa_district,
            bank_name,
            disbursing_branch_address: disbursing_branch_address.map(truncate_address),
            disbursing_branch_pincode,
            pensioner_postal_address: pensioner_postal_address.map(truncate_address),
            pensioner_pincode,
            state,
            data_source: data_source.to_string(),
        }
    }
}

fn truncate_address(address: String) -> String {
    if address.chars().count() <= MAX_ADDRESS_LEN {
        address
    } else {
        address.chars().take(MAX_ADDRESS_LEN).collect()
    }
}
