use umetadata_core::{
    MetadataAdminService, MetadataService, MetadataStore, OpenMode, ServiceCode, StationRecord,
    WireTimestamp, YEAR_3000_EPOCH_SECONDS,
};

fn ctu_record() -> StationRecord {
    StationRecord {
        network: "UU".to_string(),
        name: "CTU".to_string(),
        description: Some("Cottonwood Canyon, UT, USA".to_string()),
        latitude: 40.6925,
        longitude: -111.75034,
        elevation: 1731.0,
        start_time: 1_590_624_000,
        end_time: YEAR_3000_EPOCH_SECONDS,
        last_modified: Some(WireTimestamp {
            seconds: 1_727_969_872,
            nanos: 0,
        }),
    }
}

fn ynp_records() -> Vec<StationRecord> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/ynp_stations.json");
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn loaded_station_is_served_as_wire_record() {
    let store = MetadataStore::open_in_memory().unwrap();
    let report = MetadataAdminService::new(&store)
        .load_stations(&[ctu_record()])
        .unwrap();
    assert_eq!(report.inserted, 1);

    let service = MetadataService::new(&store);

    assert_eq!(service.active_station("uu", "ctu").unwrap(), ctu_record());
    assert_eq!(service.all_active_stations().unwrap(), vec![ctu_record()]);
}

#[test]
fn missing_station_maps_to_not_found() {
    let store = MetadataStore::open_in_memory().unwrap();
    let service = MetadataService::new(&store);

    let err = service.active_station("UU", "NONE").unwrap_err();

    assert_eq!(err.code, ServiceCode::NotFound);
    assert!(service.all_active_stations().unwrap().is_empty());
}

#[test]
fn blank_request_codes_map_to_invalid_argument() {
    let store = MetadataStore::open_in_memory().unwrap();
    let service = MetadataService::new(&store);

    let err = service.active_station("", "CTU").unwrap_err();

    assert_eq!(err.code, ServiceCode::InvalidArgument);
    assert!(err.message.contains("network"));
}

#[test]
fn store_failures_map_to_generic_internal_error() {
    let mut store = MetadataStore::open_in_memory().unwrap();
    store.close().unwrap();
    let service = MetadataService::new(&store);

    let err = service.all_active_stations().unwrap_err();

    assert_eq!(err.code, ServiceCode::Internal);
    assert_eq!(err.message, "server-side query failed");
}

#[test]
fn load_report_lists_rejected_records_by_input_position() {
    let store = MetadataStore::open_in_memory().unwrap();
    let bad_latitude = StationRecord {
        name: "BAD".to_string(),
        latitude: 123.0,
        ..ctu_record()
    };
    let overlapping = StationRecord {
        start_time: 1_600_000_000,
        ..ctu_record()
    };

    let report = MetadataAdminService::new(&store)
        .load_stations(&[ctu_record(), bad_latitude, overlapping])
        .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].index, 1);
    assert!(report.rejected[0].message.contains("latitude"));
}

#[test]
fn seed_file_loads_once_and_reloads_as_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ynp.sqlite3");
    let records = ynp_records();
    assert_eq!(records.len(), 55);

    let store = MetadataStore::open(&path, OpenMode::ReadWrite).unwrap();
    let admin = MetadataAdminService::new(&store);
    let first = admin.load_stations(&records).unwrap();
    let second = admin.load_stations(&records).unwrap();

    assert_eq!(first.inserted, 55);
    assert!(first.rejected.is_empty());
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 55);

    let reader = MetadataStore::open(&path, OpenMode::ReadOnly).unwrap();
    let flwy = MetadataService::new(&reader)
        .active_station_at("IW", "FLWY", 1_700_000_000)
        .unwrap();
    assert_eq!(flwy.description.as_deref(), Some("Flagg Ranch, Wyoming, USA"));
}
