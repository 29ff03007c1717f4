//! Plotting text inputs the way the binary does.

use heatmap_common::{PlotError, Shape};
use heatmap_plot::{apply_params, open_sink, ShapeFormat, TextShapeSource};
use plot_engine::source::ShapeSource;
use plot_engine::{CellFileIndex, PartitionKind, PlotConfig, Plotter, TileManifest};
use std::path::Path;
use test_utils::{temp_test_dir, uniform_points, unit_world};

fn write_points(path: &Path, shapes: &[Shape]) {
    let text: String = shapes
        .iter()
        .filter_map(Shape::centroid)
        .map(|p| format!("{},{}\n", p.x, p.y))
        .collect();
    std::fs::write(path, text).unwrap();
}

fn params(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Input
// ============================================================================

#[test]
fn test_text_source_reads_every_line() {
    let dir = temp_test_dir();
    let input = dir.path().join("points.txt");
    write_points(&input, &uniform_points(10_000, &unit_world(), 1));

    let source = TextShapeSource::open(&input, ShapeFormat::Point, 4).unwrap();
    assert_eq!(source.split_count(), 4);

    let mut total = 0;
    for split in 0..source.split_count() {
        for batch in source.read_split(split).unwrap() {
            total += batch.unwrap().len();
        }
    }
    assert_eq!(total, 10_000);

    let summary = source.summary().unwrap();
    assert_eq!(summary.record_count, 10_000);
    let mbr = summary.mbr.unwrap();
    assert!(unit_world().contains_point(mbr.min_x, mbr.min_y));
}

#[test]
fn test_missing_input() {
    let err = TextShapeSource::open("/nonexistent/points.txt", ShapeFormat::Point, 1)
        .err()
        .unwrap();
    assert!(matches!(err, PlotError::Io(_)));
}

#[test]
fn test_rect_input_summary() {
    let source = TextShapeSource::from_text("0,0,1,1\n# comment\n\n5,2,3,8\n", ShapeFormat::Rect, 2);
    let summary = source.summary().unwrap();
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.mbr.map(|m| (m.max_x, m.max_y)), Some((5.0, 8.0)));
}

// ============================================================================
// Runs
// ============================================================================

#[test]
fn test_plot_png() {
    let dir = temp_test_dir();
    let input = dir.path().join("points.txt");
    let output = dir.path().join("heat.png");
    write_points(&input, &uniform_points(1_000, &unit_world(), 2));

    let mut config = PlotConfig::default();
    let options = apply_params(
        &mut config,
        &params(&["shape:point", "width:200", "height:200", "radius:4", "partition:grid", "splits:3", "-smooth"]),
    )
    .unwrap();

    let source = TextShapeSource::open(&input, options.shape, options.splits).unwrap();
    let mut sink = open_sink(&output, &config).unwrap();
    let summary = Plotter::new(&config, &source).run(sink.as_mut()).unwrap();

    assert_eq!(summary.partition, PartitionKind::Grid);
    assert_eq!(summary.shapes_read, 1_000);
    let png = std::fs::read(&output).unwrap();
    assert_eq!(&png[1..4], b"PNG");

    // A second run must not clobber the image
    assert!(matches!(
        open_sink(&output, &config).err().unwrap(),
        PlotError::OutputExists(_)
    ));
    apply_params(&mut config, &params(&["-overwrite"])).unwrap();
    assert!(open_sink(&output, &config).is_ok());
}

#[test]
fn test_plot_tiles_with_index() {
    let dir = temp_test_dir();
    let input = dir.path().join("points.txt");
    let index_path = dir.path().join("cells.txt");
    let output = dir.path().join("tiles");
    write_points(&input, &uniform_points(1_000, &unit_world(), 3));
    std::fs::write(&index_path, "1,0,0,50,100\n2,50,0,100,100\n").unwrap();

    let mut config = PlotConfig::default();
    let options = apply_params(
        &mut config,
        &params(&[
            "partition:space",
            "width:100",
            "height:100",
            "rect:0,0,100,100",
            &format!("index:{}", index_path.display()),
        ]),
    )
    .unwrap();

    let source = TextShapeSource::open(&input, options.shape, options.splits).unwrap();
    let index = CellFileIndex::new(options.index.unwrap());
    let mut sink = open_sink(&output, &config).unwrap();
    let summary = Plotter::new(&config, &source)
        .with_index(&index)
        .run(sink.as_mut())
        .unwrap();

    assert_eq!(summary.partition, PartitionKind::Skewed);
    assert_eq!(summary.tiles, 2);
    let manifest: TileManifest =
        serde_json::from_slice(&std::fs::read(output.join("tiles.json")).unwrap()).unwrap();
    let widths: Vec<usize> = manifest.tiles.iter().map(|t| t.width).collect();
    assert_eq!(widths, vec![50, 50]);
}

#[test]
fn test_bad_parameters_are_configuration_errors() {
    let mut config = PlotConfig::default();
    let err = apply_params(&mut config, &params(&["gradient:rainbow"])).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    let err = apply_params(&mut config, &params(&["valuerange:9..1"])).unwrap_err();
    assert!(matches!(err, PlotError::InvalidValueRange(_)));
}
