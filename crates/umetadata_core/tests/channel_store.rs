use umetadata_core::{Channel, ChannelRecord, ErrorKind, InsertOutcome, MetadataStore, OpenMode};

fn channel(station: &str, name: &str, location_code: &str, start: i64, end: i64) -> Channel {
    Channel::from_record(&ChannelRecord {
        network: "UU".to_string(),
        station: station.to_string(),
        name: name.to_string(),
        location_code: location_code.to_string(),
        latitude: 40.6925,
        longitude: -111.75034,
        elevation: 1731.0,
        sampling_rate: 100.0,
        azimuth: 0.0,
        dip: -90.0,
        start_time: start,
        end_time: end,
        last_modified: None,
    })
    .unwrap()
}

#[test]
fn inserted_channel_is_found_by_full_key() {
    let store = MetadataStore::open_in_memory().unwrap();
    let hhz = channel("CTU", "HHZ", "01", 100, 1000);

    assert_eq!(store.insert_channel(&hhz).unwrap(), InsertOutcome::Inserted);

    let found = store
        .active_channel_at("uu", "ctu", "hhz", "01", 500)
        .unwrap()
        .unwrap();
    assert_eq!(found, hhz);
    assert!(store
        .active_channel_at("UU", "CTU", "HHZ", "02", 500)
        .unwrap()
        .is_none());
    assert!(store
        .active_channel_at("UU", "CTU", "HHZ", "01", 1000)
        .unwrap()
        .is_none());
}

#[test]
fn blank_location_code_matches_dashes() {
    let store = MetadataStore::open_in_memory().unwrap();
    store.insert_channel(&channel("CTU", "EHZ", "", 0, 10)).unwrap();

    let found = store.active_channel_at("UU", "CTU", "EHZ", " ", 5).unwrap().unwrap();
    let by_dashes = store.active_channel_at("UU", "CTU", "EHZ", "--", 5).unwrap();

    assert_eq!(found.location_code().unwrap(), "--");
    assert_eq!(by_dashes, Some(found));
}

#[test]
fn overlap_rule_includes_location_code() {
    let store = MetadataStore::open_in_memory().unwrap();

    assert_eq!(
        store.insert_channel(&channel("CTU", "HHZ", "01", 0, 100)).unwrap(),
        InsertOutcome::Inserted
    );
    assert_eq!(
        store.insert_channel(&channel("CTU", "HHZ", "02", 0, 100)).unwrap(),
        InsertOutcome::Inserted
    );
    assert_eq!(
        store.insert_channel(&channel("CTU", "HHZ", "01", 50, 150)).unwrap(),
        InsertOutcome::DuplicateSkipped
    );
    assert_eq!(
        store.insert_channel(&channel("CTU", "HHZ", "01", 101, 150)).unwrap(),
        InsertOutcome::Inserted
    );
}

#[test]
fn touching_channel_windows_count_as_overlap() {
    let store = MetadataStore::open_in_memory().unwrap();
    store.insert_channel(&channel("CTU", "HHZ", "01", 100, 200)).unwrap();

    let outcome = store
        .insert_channel(&channel("CTU", "HHZ", "01", 200, 300))
        .unwrap();

    assert_eq!(outcome, InsertOutcome::DuplicateSkipped);
    assert!(store
        .active_channel_at("UU", "CTU", "HHZ", "01", 250)
        .unwrap()
        .is_none());
}

#[test]
fn station_channels_are_filtered_by_station_and_time() {
    let store = MetadataStore::open_in_memory().unwrap();
    let summary = store
        .insert_channels(&[
            channel("CTU", "HHZ", "01", 0, 100),
            channel("CTU", "HHN", "01", 0, 100),
            channel("CTU", "HHE", "01", 100, 200),
            channel("MOUT", "HHZ", "01", 0, 100),
        ])
        .unwrap();
    assert_eq!(summary.inserted, 4);

    let mut names = store
        .active_station_channels_at("UU", "CTU", 50)
        .unwrap()
        .iter()
        .map(|channel| channel.name().unwrap().to_string())
        .collect::<Vec<_>>();
    names.sort();

    assert_eq!(names, vec!["HHN", "HHZ"]);
    assert_eq!(store.active_channels_at(50).unwrap().len(), 3);
    assert_eq!(store.active_channels_at(150).unwrap().len(), 1);
}

#[test]
fn channel_reseed_is_idempotent() {
    let store = MetadataStore::open_in_memory().unwrap();
    let channels = vec![
        channel("CTU", "HHZ", "01", 0, i64::MAX),
        channel("CTU", "HHN", "01", 0, i64::MAX),
    ];

    store.insert_channels(&channels).unwrap();
    let second = store.insert_channels(&channels).unwrap();

    assert_eq!((second.inserted, second.skipped), (0, 2));
    assert_eq!(store.active_channels().unwrap().len(), 2);
}

#[test]
fn read_only_store_rejects_channel_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.sqlite3");
    drop(MetadataStore::open(&path, OpenMode::ReadWrite).unwrap());

    let reader = MetadataStore::open(&path, OpenMode::ReadOnly).unwrap();
    let err = reader
        .insert_channel(&channel("CTU", "HHZ", "01", 0, 10))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}
