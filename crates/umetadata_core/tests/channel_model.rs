use umetadata_core::{Channel, ChannelKey, ChannelRecord, ErrorKind, ModelError};

fn record() -> ChannelRecord {
    ChannelRecord {
        network: "UU".to_string(),
        station: "CTU".to_string(),
        name: "HHZ".to_string(),
        location_code: "01".to_string(),
        latitude: 40.6925,
        longitude: -111.75034,
        elevation: 1731.0,
        sampling_rate: 100.0,
        azimuth: 0.0,
        dip: -90.0,
        start_time: 1_590_624_000,
        end_time: 32_503_680_000,
        last_modified: None,
    }
}

#[test]
fn azimuth_is_half_open() {
    let mut channel = Channel::new();
    channel.set_azimuth(0.0).unwrap();
    channel.set_azimuth(359.999).unwrap();

    let err = channel.set_azimuth(360.0).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.field(), "azimuth");
    assert_eq!(channel.azimuth().unwrap(), 359.999);
    assert!(channel.set_azimuth(-0.001).is_err());
}

#[test]
fn dip_bounds_are_inclusive() {
    let mut channel = Channel::new();
    channel.set_dip(-90.0).unwrap();
    channel.set_dip(90.0).unwrap();

    assert!(channel.set_dip(90.0001).is_err());
    assert!(channel.set_dip(-90.0001).is_err());
    assert_eq!(channel.dip().unwrap(), 90.0);
}

#[test]
fn sampling_rate_must_be_positive_and_finite() {
    let mut channel = Channel::new();
    channel.set_sampling_rate(0.01).unwrap();

    assert!(channel.set_sampling_rate(0.0).is_err());
    assert!(channel.set_sampling_rate(-40.0).is_err());
    assert!(channel.set_sampling_rate(f64::INFINITY).is_err());
    assert_eq!(channel.sampling_rate().unwrap(), 0.01);
}

#[test]
fn blank_location_code_is_stored_as_dashes() {
    let mut channel = Channel::new();
    assert!(!channel.has_location_code());

    channel.set_location_code("  ");
    assert_eq!(channel.location_code().unwrap(), "--");

    channel.set_location_code(" 0 1");
    assert_eq!(channel.location_code().unwrap(), "01");

    let key = ChannelKey::new("uu", "ctu", "hhz", "").unwrap();
    assert_eq!(key.location_code, "--");
    assert_eq!(key.to_string(), "UU.CTU.HHZ.--");
}

#[test]
fn from_record_validates_and_canonicalizes() {
    let channel = Channel::from_record(&ChannelRecord {
        network: "uu".to_string(),
        longitude: 248.24966,
        ..record()
    })
    .unwrap();

    assert_eq!(channel.network().unwrap(), "UU");
    assert!((channel.longitude().unwrap() - -111.75034).abs() < 1.0e-9);
    assert!(channel.last_modified().is_some());

    let err = Channel::from_record(&ChannelRecord {
        azimuth: 360.0,
        ..record()
    })
    .unwrap_err();
    assert_eq!(err.field(), "azimuth");
}

#[test]
fn fully_populated_channel_round_trips() {
    let mut channel = Channel::new();
    channel.set_network("UU").unwrap();
    channel.set_station("CTU").unwrap();
    channel.set_name("HHN").unwrap();
    channel.set_location_code("01");
    channel.set_latitude(40.6925).unwrap();
    channel.set_longitude(-111.75034);
    channel.set_elevation(1731.0).unwrap();
    channel.set_sampling_rate(100.0).unwrap();
    channel.set_azimuth(359.999).unwrap();
    channel.set_dip(0.0).unwrap();
    channel.set_validity(1_590_624_000, 1_700_000_000).unwrap();

    let back = Channel::from_record(&channel.to_record().unwrap()).unwrap();

    assert_eq!(back, channel);
    assert_eq!(back.last_modified(), channel.last_modified());
}

#[test]
fn rejected_latitude_leaves_fresh_channel_unset() {
    let mut channel = Channel::new();

    let err = channel.set_latitude(91.0).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(!channel.has_latitude());
    assert_eq!(channel.latitude().unwrap_err().kind(), ErrorKind::NotSet);
}

#[test]
fn export_of_incomplete_channel_names_missing_field() {
    assert!(Channel::from_record(&record()).unwrap().check_complete().is_ok());

    let mut channel = Channel::new();
    channel.set_valid_from(1_590_624_000).unwrap();
    channel.set_network("UU").unwrap();
    channel.set_station("CTU").unwrap();
    channel.set_name("HHZ").unwrap();

    assert_eq!(
        channel.to_record().unwrap_err(),
        ModelError::Incomplete {
            field: "location_code"
        }
    );
}

#[test]
fn json_without_location_code_defaults_to_dashes() {
    let channel: Channel = serde_json::from_str(
        r#"{
            "network": "UU",
            "station": "CTU",
            "name": "EHZ",
            "latitude": 40.6925,
            "longitude": -111.75034,
            "elevation": 1731.0,
            "sampling_rate": 100.0,
            "azimuth": 0.0,
            "dip": -90.0,
            "start_time": 1590624000
        }"#,
    )
    .unwrap();

    assert_eq!(channel.location_code().unwrap(), "--");
    assert_eq!(channel.key().unwrap().to_string(), "UU.CTU.EHZ.--");
}
