/// Source identifiers; these double as the `data_source` provenance tag
pub const DLC_PORTAL_SOURCE: &str = "dlc_portal";
pub const BANK_IOB_SOURCE: &str = "bank_iob";
pub const BANK_GENERIC_SOURCE: &str = "bank_generic";
pub const DOP_SOURCE: &str = "dop";
pub const MANUAL_SOURCE: &str = "manual";

// Disbursing authority names assumed when a source has no bank column
pub const IOB_BANK_NAME: &str = "INDIAN OVERSEAS BANK";
pub const DOP_BANK_NAME: &str = "DEPARTMENT OF POSTS";

/// Default target collection for canonical records
pub const DEFAULT_COLLECTION: &str = "pensioners";

/// Free-text address fields are cut to this many characters before storage
pub const MAX_ADDRESS_LEN: usize = 200;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Convert a user-friendly source name to its identifier
pub fn source_name_to_id(name: &str) -> String {
    match name.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
        "dlc" | "dlc_portal" => DLC_PORTAL_SOURCE.to_string(),
        "iob" | "indian_overseas_bank" | "bank_iob" => BANK_IOB_SOURCE.to_string(),
        "bank" | "bank_generic" => BANK_GENERIC_SOURCE.to_string(),
        "dop" | "post" | "india_post" | "department_of_posts" => DOP_SOURCE.to_string(),
        "manual" => MANUAL_SOURCE.to_string(),
        other => other.to_string(),
    }
}

/// Get all supported source identifiers
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![
        DLC_PORTAL_SOURCE,
        BANK_IOB_SOURCE,
        BANK_GENERIC_SOURCE,
        DOP_SOURCE,
        MANUAL_SOURCE,
    ]
}
