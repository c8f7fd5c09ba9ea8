//! Subcommand handlers.
//!
//! Loads open the store read-write; every query opens it read-only.

use anyhow::{bail, Context, Result};
use log::info;
use serde::Serialize;
use std::path::Path;
use umetadata_core::{
    ChannelRecord, LoadReport, MetadataAdminService, MetadataService, MetadataStore, OpenMode,
    StationRecord,
};

pub fn load_stations(db_path: &Path, file: &Path) -> Result<()> {
    let records: Vec<StationRecord> = read_json(file)?;
    let store = MetadataStore::open(db_path, OpenMode::ReadWrite)
        .with_context(|| format!("failed to open `{}`", db_path.display()))?;
    let report = MetadataAdminService::new(&store).load_stations(&records)?;
    finish_load("load_stations", records.len(), &report)
}

pub fn load_channels(db_path: &Path, file: &Path) -> Result<()> {
    let records: Vec<ChannelRecord> = read_json(file)?;
    let store = MetadataStore::open(db_path, OpenMode::ReadWrite)
        .with_context(|| format!("failed to open `{}`", db_path.display()))?;
    let report = MetadataAdminService::new(&store).load_channels(&records)?;
    finish_load("load_channels", records.len(), &report)
}

pub fn print_stations(db_path: &Path, at: Option<i64>) -> Result<()> {
    let store = open_read_only(db_path)?;
    let service = MetadataService::new(&store);
    let records = match at {
        Some(at) => service.all_active_stations_at(at)?,
        None => service.all_active_stations()?,
    };
    print_json(&records)
}

pub fn print_station(db_path: &Path, network: &str, name: &str, at: Option<i64>) -> Result<()> {
    let store = open_read_only(db_path)?;
    let service = MetadataService::new(&store);
    let record = match at {
        Some(at) => service.active_station_at(network, name, at)?,
        None => service.active_station(network, name)?,
    };
    print_json(&record)
}

pub fn print_channels(db_path: &Path, at: Option<i64>) -> Result<()> {
    let store = open_read_only(db_path)?;
    let channels = match at {
        Some(at) => store.active_channels_at(at)?,
        None => store.active_channels()?,
    };
    let records = channels
        .iter()
        .map(|channel| channel.to_record())
        .collect::<Result<Vec<_>, _>>()?;
    print_json(&records)
}

fn open_read_only(db_path: &Path) -> Result<MetadataStore> {
    MetadataStore::open(db_path, OpenMode::ReadOnly)
        .with_context(|| format!("failed to open `{}` read-only", db_path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(file: &Path) -> Result<T> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read `{}`", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in `{}`", file.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn finish_load(operation: &str, total: usize, report: &LoadReport) -> Result<()> {
    info!(
        "event={} module=cli status=ok total={} inserted={} skipped={} rejected={}",
        operation,
        total,
        report.inserted,
        report.skipped,
        report.rejected.len()
    );
    println!(
        "total={} inserted={} skipped={} rejected={}",
        total,
        report.inserted,
        report.skipped,
        report.rejected.len()
    );
    for rejected in &report.rejected {
        eprintln!("record {}: {}", rejected.index, rejected.message);
    }
    if !report.rejected.is_empty() {
        bail!("{} of {} records were rejected", report.rejected.len(), total);
    }
    Ok(())
}
