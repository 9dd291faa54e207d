use std::collections::HashSet;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use pension_ingest::domain::{AgeCategory, CanonicalRecord, Cell, RawRow};
use pension_ingest::error::IngestError;
use pension_ingest::pipeline::ingestion::{NdjsonReader, VecReader};
use pension_ingest::pipeline::processing::age::AgeDeriver;
use pension_ingest::pipeline::processing::geography::GeographyResolver;
use pension_ingest::pipeline::processing::normalize::adapters::{
    BankExportAdapter, DlcPortalAdapter, PostOfficeAdapter,
};
use pension_ingest::pipeline::{CanonicalRecordBuilder, IngestOptions, IngestionController, RunPhase};
use pension_ingest::storage::{InMemoryStore, PensionerStore, SqliteStore};
use tempfile::tempdir;

const GEOGRAPHY: &str = r#"{
    "pincodeRanges": {
        "DELHI": ["11"],
        "MAHARASHTRA": ["40", "41", "42", "43", "44"],
        "KARNATAKA": ["56", "57", "58", "59"]
    },
    "specialCases": {}
}"#;

fn builder() -> CanonicalRecordBuilder {
    CanonicalRecordBuilder::new(
        GeographyResolver::from_json_str(GEOGRAPHY).unwrap(),
        AgeDeriver::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
    )
}

fn dop_row(ppo: &str, year: Cell, address: &str, pincode: &str) -> RawRow {
    RawRow::new(vec![
        Cell::from(ppo),
        year,
        Cell::from("MUMBAI GPO H.O"),
        Cell::from(address),
        Cell::from(pincode),
    ])
}

fn dop_rows() -> Vec<RawRow> {
    vec![
        dop_row("P1", Cell::Number(1960.0), "Fort", "400001"),
        dop_row("P2", Cell::Number(1945.0), "Dadar", "400014"),
        dop_row("", Cell::Number(1950.0), "Andheri", "400053"),
        dop_row("P3", Cell::from("unknown"), "Thane", "400601"),
        dop_row("P4", Cell::Number(1932.0), "Pune Camp", "411001"),
    ]
}

#[test]
fn test_end_to_end_three_rows() -> Result<()> {
    let mut store = InMemoryStore::new();
    let mut controller = IngestionController::new(&mut store, builder(), IngestOptions::default());

    let rows = VecReader::new(vec![
        dop_row("P1", Cell::Number(1960.0), "Parliament Street", "110001"),
        dop_row("", Cell::Empty, "Colaba", "400001"),
        dop_row("P1", Cell::Number(1960.0), "Parliament Street", "110001"),
    ]);
    let report = controller.run(&PostOfficeAdapter::new(), "dop", rows)?;

    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.errors, 1);

    let record = store.get("pensioners", "P1").unwrap();
    assert_eq!(record.age, Some(65));
    assert_eq!(record.age_category, AgeCategory::Sixties);
    assert_eq!(record.state, "DELHI");
    assert_eq!(record.data_source, "dop");
    Ok(())
}

#[test]
fn test_second_run_is_idempotent() -> Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("pensioners.db");

    let first = {
        let store = SqliteStore::open(&db_path)?;
        let mut controller = IngestionController::new(store, builder(), IngestOptions::default());
        controller.run(&PostOfficeAdapter::new(), "dop", VecReader::new(dop_rows()))?
    };
    assert_eq!(first.inserted, 4);
    assert_eq!(first.errors, 1);

    let store = SqliteStore::open(&db_path)?;
    let mut controller = IngestionController::new(store, builder(), IngestOptions::default());
    let second = controller.run(&PostOfficeAdapter::new(), "dop", VecReader::new(dop_rows()))?;

    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, first.valid_rows());
    assert_eq!(second.errors, 1);
    assert_eq!(controller.store().records("pensioners")?.len(), 4);
    Ok(())
}

#[test]
fn test_first_occurrence_wins() -> Result<()> {
    let mut store = InMemoryStore::new();
    let mut controller = IngestionController::new(&mut store, builder(), IngestOptions::default());

    let rows = VecReader::new(vec![
        dop_row("P7", Cell::Number(1970.0), "First Address", "400001"),
        dop_row("P7", Cell::Number(1930.0), "Second Address, much more complete", "560001"),
    ]);
    let report = controller.run(&PostOfficeAdapter::new(), "dop", rows)?;
    assert_eq!((report.inserted, report.duplicates), (1, 1));

    let record = store.get("pensioners", "P7").unwrap();
    assert_eq!(record.pensioner_postal_address.as_deref(), Some("First Address"));
    assert_eq!(record.age, Some(55));
    assert_eq!(record.age_category, AgeCategory::Below60);
    assert_eq!(record.state, "MAHARASHTRA");
    Ok(())
}

#[test]
fn test_row_error_isolated() -> Result<()> {
    let mut store = InMemoryStore::new();
    let mut controller = IngestionController::new(&mut store, builder(), IngestOptions::default());

    let report = controller.run(&PostOfficeAdapter::new(), "dop", VecReader::new(dop_rows()))?;
    assert_eq!(report.errors, 1);
    assert_eq!(report.inserted, 4);
    assert_eq!(report.row_errors[0].row_index, 2);

    let p3 = store.get("pensioners", "P3").unwrap();
    assert_eq!(p3.age, None);
    assert_eq!(p3.age_category, AgeCategory::Unknown);
    assert_eq!(store.get("pensioners", "P4").unwrap().age_category, AgeCategory::NinetyPlus);
    Ok(())
}

#[test]
fn test_keys_unique_across_sources() -> Result<()> {
    let mut store = SqliteStore::open_in_memory()?;

    {
        let mut controller = IngestionController::new(&mut store, builder(), IngestOptions::default());
        controller.run(&PostOfficeAdapter::new(), "dop", VecReader::new(dop_rows()))?;
    }

    // The same PPO shows up again in a bank export
    let bank_rows = VecReader::new(vec![
        RawRow::new(vec![
            Cell::from("P2"),
            Cell::from("01/01/1945"),
            Cell::from("PAO MUMBAI HO"),
        ]),
        RawRow::new(vec![
            Cell::from("IOB-1"),
            Cell::from("12.12.1952"),
            Cell::from("PAO CHENNAI HO"),
            Cell::from("Anna Salai"),
            Cell::from("600002"),
            Cell::from("T Nagar"),
            Cell::from("600017"),
        ]),
    ]);
    let mut controller = IngestionController::new(&mut store, builder(), IngestOptions::default());
    let report = controller.run(&BankExportAdapter::indian_overseas_bank(), "bank_iob", bank_rows)?;
    assert_eq!((report.inserted, report.duplicates), (1, 1));

    let records = store.records("pensioners")?;
    let keys: HashSet<&str> = records.iter().map(|r| r.ppo_number.as_str()).collect();
    assert_eq!(keys.len(), records.len());

    let iob = records.iter().find(|r| r.ppo_number == "IOB-1").unwrap();
    assert_eq!(iob.bank_name.as_deref(), Some("INDIAN OVERSEAS BANK"));
    assert_eq!(iob.state, "Unknown");
    assert_eq!(iob.age, Some(72));
    assert_eq!(iob.data_source, "bank_iob");
    Ok(())
}

/// Store that fails every bulk insert after `ok_chunks` successes
struct FlakyStore {
    inner: InMemoryStore,
    ok_chunks: usize,
    fail_key_load: bool,
}

impl PensionerStore for FlakyStore {
    fn existing_keys(&self, collection: &str) -> pension_ingest::Result<HashSet<String>> {
        if self.fail_key_load {
            return Err(IngestError::Store {
                message: "connection refused".to_string(),
            });
        }
        self.inner.existing_keys(collection)
    }

    fn bulk_insert(&mut self, collection: &str, records: &[CanonicalRecord]) -> pension_ingest::Result<usize> {
        if self.ok_chunks == 0 {
            return Err(IngestError::Store {
                message: "chunk rejected".to_string(),
            });
        }
        self.ok_chunks -= 1;
        self.inner.bulk_insert(collection, records)
    }
}

#[test]
fn test_flush_failure_reports_committed_chunks() {
    let store = FlakyStore {
        inner: InMemoryStore::new(),
        ok_chunks: 1,
        fail_key_load: false,
    };
    let options = IngestOptions {
        chunk_size: 2,
        ..IngestOptions::default()
    };
    let mut controller = IngestionController::new(store, builder(), options);

    let result = controller.run(&PostOfficeAdapter::new(), "dop", VecReader::new(dop_rows()));
    match result {
        Err(IngestError::Flush { chunk_index, report, .. }) => {
            assert_eq!(chunk_index, 1);
            assert_eq!(report.chunks_committed, 1);
            assert_eq!(report.inserted, 2);
        }
        other => panic!("expected flush failure, got {other:?}"),
    }
    assert_eq!(controller.phase(), RunPhase::Flushing);
    assert_eq!(controller.store().inner.records("pensioners").len(), 2);
}

#[test]
fn test_key_load_failure_is_fatal() {
    let store = FlakyStore {
        inner: InMemoryStore::new(),
        ok_chunks: 10,
        fail_key_load: true,
    };
    let mut controller = IngestionController::new(store, builder(), IngestOptions::default());

    let result = controller.run(&PostOfficeAdapter::new(), "dop", VecReader::new(dop_rows()));
    assert!(matches!(result, Err(IngestError::KeyLoad { .. })));
    assert!(controller.store().inner.records("pensioners").is_empty());
}

#[test]
fn test_ndjson_file_with_header_and_bad_line() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("karnataka.ndjson");
    let mut file = std::fs::File::create(&input)?;
    writeln!(file, r#"["S.No","PPO No","YOB","PSA","Bank","Branch","Branch PIN","Address","PIN","State","District"]"#)?;
    writeln!(file, r#"[1,"KA/1",1950,"DTO MYSORE H.O","SBI","Sayyaji Rao Road",570001,"Kuvempunagar",570023,"",""]"#)?;
    writeln!(file, r#"[2,"KA/2",1961,"DTO UDUPI H.O","CANARA BANK",null,null,"Manipal","576,104","Karnataka","Udupi"]"#)?;
    writeln!(file, "this line is broken")?;
    writeln!(file, r#"[4,"KA/1",1950,"DTO MYSORE H.O","SBI",null,null,null,null,null,null]"#)?;
    drop(file);

    let mut store = InMemoryStore::new();
    let options = IngestOptions {
        header_rows: 1,
        ..IngestOptions::default()
    };
    let mut controller = IngestionController::new(&mut store, builder(), options);
    let report = controller.run(&DlcPortalAdapter::new(), "DLC Portal - Karnataka", NdjsonReader::open(&input)?)?;

    assert_eq!((report.total_rows, report.inserted, report.duplicates, report.errors), (4, 2, 1, 1));

    let ka1 = store.get("pensioners", "KA/1").unwrap();
    assert_eq!(ka1.state, "KARNATAKA");
    assert_eq!(ka1.psa_district.as_deref(), Some("DTO MYSORE"));
    assert_eq!(ka1.disbursing_branch_pincode.as_deref(), Some("570001"));
    assert_eq!(ka1.data_source, "DLC Portal - Karnataka");

    let ka2 = store.get("pensioners", "KA/2").unwrap();
    assert_eq!(ka2.pensioner_pincode.as_deref(), Some("576104"));
    assert_eq!(ka2.district.as_deref(), Some("Udupi"));
    assert_eq!(ka2.age_category, AgeCategory::Sixties);
    Ok(())
}

#[test]
fn test_missing_geography_file_degrades() -> Result<()> {
    let dir = tempdir()?;
    let resolver = GeographyResolver::load_or_empty(&dir.path().join("absent.json"));
    let builder = CanonicalRecordBuilder::new(
        resolver,
        AgeDeriver::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
    );

    let mut store = InMemoryStore::new();
    let mut controller = IngestionController::new(&mut store, builder, IngestOptions::default());
    let report = controller.run(&PostOfficeAdapter::new(), "dop", VecReader::new(dop_rows()))?;

    assert_eq!(report.inserted, 4);
    assert!(store.records("pensioners").iter().all(|r| r.state == "Unknown"));
    Ok(())
}

#[test]
fn test_shipped_geography_table() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/pincode_ranges.json");
    let resolver = GeographyResolver::load_or_empty(&path);

    assert!(!resolver.is_empty());
    assert_eq!(resolver.resolve_state(Some("560050")), "KARNATAKA");
    assert_eq!(resolver.resolve_state(Some("110001")), "DELHI");
    assert_eq!(resolver.resolve_state(Some("403001")), "GOA");
    assert_eq!(resolver.resolve_state(Some("400001")), "MAHARASHTRA");
    assert_eq!(resolver.resolve_state(Some("12345")), "Unknown");
}

#[test]
fn test_bare_year_in_date_of_birth_gives_unknown_age() -> Result<()> {
    let mut store = InMemoryStore::new();
    let mut controller = IngestionController::new(&mut store, builder(), IngestOptions::default());

    let rows = VecReader::new(vec![
        RawRow::new(vec![Cell::from("IOB-1"), Cell::Number(1950.0)]),
        RawRow::new(vec![Cell::from("IOB-2"), Cell::from("15-08-50")]),
        RawRow::new(vec![Cell::from("IOB-3"), Cell::from("15-08-1950")]),
    ]);
    let report = controller.run(&BankExportAdapter::indian_overseas_bank(), "bank_iob", rows)?;
    assert_eq!(report.inserted, 3);

    for ppo in ["IOB-1", "IOB-2"] {
        let record = store.get("pensioners", ppo).unwrap();
        assert_eq!(record.age, None, "{ppo}");
        assert_eq!(record.age_category, AgeCategory::Unknown, "{ppo}");
    }
    assert_eq!(store.get("pensioners", "IOB-3").unwrap().age, Some(74));
    Ok(())
}

#[test]
fn test_large_numeric_ppo_numbers_are_distinct_keys() -> Result<()> {
    let mut store = InMemoryStore::new();
    let mut controller = IngestionController::new(&mut store, builder(), IngestOptions::default());

    let mut first = dop_row("", Cell::Number(1950.0), "Fort", "400001");
    let mut second = dop_row("", Cell::Number(1951.0), "Dadar", "400014");
    first.cells[0] = Cell::Number(1e19);
    second.cells[0] = Cell::Number(2e19);
    let rows = VecReader::new(vec![first, second]);
    let report = controller.run(&PostOfficeAdapter::new(), "dop", rows)?;

    assert_eq!((report.inserted, report.duplicates), (2, 0));
    assert!(store.get("pensioners", "10000000000000000000").is_some());
    assert!(store.get("pensioners", "20000000000000000000").is_some());
    Ok(())
}

#[test]
fn test_blank_lines_do_not_shift_row_numbers() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("dop.ndjson");
    let mut file = std::fs::File::create(&input)?;
    writeln!(file, r#"["PPO","YOB","PSA","Address","PIN"]"#)?;
    writeln!(file)?;
    writeln!(file, r#"["D/1",1950,"MUMBAI GPO H.O","Fort","400001"]"#)?;
    writeln!(file, "broken")?;
    drop(file);

    let rows: Vec<_> = NdjsonReader::open(&input)?.collect();
    let decode_index = match &rows[2] {
        Err(IngestError::RowDecode { row_index, .. }) => *row_index,
        other => panic!("expected a decode error, got {other:?}"),
    };

    let mut store = InMemoryStore::new();
    let options = IngestOptions {
        header_rows: 1,
        ..IngestOptions::default()
    };
    let mut controller = IngestionController::new(&mut store, builder(), options);
    let report = controller.run(&PostOfficeAdapter::new(), "dop", NdjsonReader::open(&input)?)?;

    assert_eq!((report.inserted, report.errors), (1, 1));
    assert_eq!(decode_index, 2);
    assert_eq!(report.row_errors[0].row_index, decode_index);
    assert!(report.row_errors[0].reason.contains("row 2"));
    assert!(report.row_errors[0].reason.contains("line 4"));
    Ok(())
}
