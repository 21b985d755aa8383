// tests/geo_files.rs
//
// Aggregation over real files in a temp data dir.

use std::fs;

use open_data_dashboard::config::SourceTable;
use open_data_dashboard::geo::{
    aggregate, DirectionsLink, FileTableLoader, SourceDefinition, SourceOutcome,
};
use tempfile::TempDir;

fn data_dir(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, bytes) in files {
        fs::write(dir.path().join(name), bytes).expect("write fixture");
    }
    dir
}

#[test]
fn one_row_csv_with_korean_headers_yields_one_marker() {
    let dir = data_dir(&[(
        "toilets.csv",
        "화장실명,y좌표,x좌표\n시청역,37.5,127.0\n".as_bytes(),
    )]);
    let sources =
        vec![SourceDefinition::new("toilets.csv", "y좌표", "x좌표").with_style("blue", "tint")];
    let agg = aggregate(
        &sources,
        &FileTableLoader::new(dir.path()),
        &DirectionsLink::default(),
    );

    let markers: Vec<_> = agg.markers().collect();
    assert_eq!(markers.len(), 1);
    assert_eq!((markers[0].lat, markers[0].lon), (37.5, 127.0));
    assert_eq!(markers[0].label, "toilets");
    assert_eq!(markers[0].style.color, "blue");
    assert!(markers[0]
        .popup
        .contains("https://www.google.com/maps/dir/?api=1&amp;destination=37.5,127.0"));
    assert!(agg.failures().is_empty());
}

#[test]
fn euc_kr_file_is_decoded() {
    let (bytes, _, _) = encoding_rs::EUC_KR.encode("쉼터명,위도,경도\n구민회관,37.57,126.98\n");
    let dir = data_dir(&[("shelters.csv", &bytes)]);
    let sources = vec![SourceDefinition::new("shelters.csv", "위도", "경도")];
    let agg = aggregate(
        &sources,
        &FileTableLoader::new(dir.path()),
        &DirectionsLink::default(),
    );
    assert_eq!(agg.markers().count(), 1);
}

#[test]
fn missing_file_is_reported_and_the_rest_still_render() {
    let dir = data_dir(&[(
        "b.csv",
        b"name,lat,lon\nx,37.1,127.1\ny,,\nz,37.3,127.3\n" as &[u8],
    )]);
    let sources = vec![
        SourceDefinition::new("a.csv", "lat", "lon"),
        SourceDefinition::new("b.csv", "lat", "lon"),
    ];
    let agg = aggregate(
        &sources,
        &FileTableLoader::new(dir.path()),
        &DirectionsLink::default(),
    );

    let failures = agg.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].source, "a.csv");
    assert!(failures[0].reason.contains("a.csv"));

    assert_eq!(agg.markers().count(), 2);
    assert_eq!(agg.skipped_rows(), 1);
    assert!(matches!(agg.outcomes[1], SourceOutcome::Loaded { .. }));
}

#[test]
fn seeded_data_dir_renders_csv_sources() {
    // The shipped data/ holds the three CSV sources; the xlsx is not bundled.
    let table = SourceTable::default_seed();
    let data = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let agg = aggregate(
        &table.sources,
        &FileTableLoader::new(data),
        &DirectionsLink::default(),
    );
    assert_eq!(agg.outcomes.len(), 4);
    assert!(agg.markers().count() >= 8);
    let failures = agg.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].source.ends_with(".xlsx"));
}

fn fixtures() -> FileTableLoader {
    FileTableLoader::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

#[test]
fn spreadsheet_first_sheet_is_read_by_default() {
    let sources =
        vec![SourceDefinition::new("chargers.xlsx", "위도", "경도").with_style("orange", "flash")];
    let agg = aggregate(&sources, &fixtures(), &DirectionsLink::default());
    assert!(agg.failures().is_empty(), "{:?}", agg.failures());

    let markers: Vec<_> = agg.markers().collect();
    assert_eq!(markers.len(), 2);
    assert_eq!((markers[0].lat, markers[0].lon), (37.5, 127.0));
    // integral cell keeps one decimal, like the sheet shows it
    assert_eq!(markers[0].raw_lon, "127.0");
    assert!(markers[0].popup.contains("destination=37.5,127.0"));
    assert_eq!(markers[0].label, "chargers");
    assert_eq!(markers[1].raw_lat, "37.5759");
    assert_eq!(agg.skipped_rows(), 1);
}

#[test]
fn spreadsheet_named_sheet_and_missing_sheet() {
    let mut second = SourceDefinition::new("chargers.xlsx", "lat", "lon");
    second.sheet = Some("비고".into());
    let agg = aggregate(&[second], &fixtures(), &DirectionsLink::default());
    let markers: Vec<_> = agg.markers().collect();
    assert_eq!(markers.len(), 1);
    assert_eq!((markers[0].lat, markers[0].lon), (37.5444, 127.0374));

    let mut missing = SourceDefinition::new("chargers.xlsx", "lat", "lon");
    missing.sheet = Some("없는시트".into());
    let agg = aggregate(&[missing], &fixtures(), &DirectionsLink::default());
    let failures = agg.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].reason.contains("없는시트"), "{}", failures[0].reason);
    assert_eq!(agg.markers().count(), 0);
}
