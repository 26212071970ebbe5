//! End-to-end drawing flow: SVG text through import, transforms, encoding
//! and back through decode with progress mapping.

use eggplot::{
    decode, encode, LayerResolveMode, Pipeline, PlotConfig, ProgressTracker, SvgSegmenter,
};

const ARTWORK: &str = r#"<svg width="100" height="100"
        xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
    <g inkscape:groupmode="layer" inkscape:label="outline">
        <rect x="10" y="10" width="50" height="30"/>
        <circle cx="35" cy="25" r="10"/>
    </g>
    <g inkscape:groupmode="layer" inkscape:label="detail" transform="translate(5,5)">
        <path d="M0,0 C10,20 30,20 40,0"/>
        <polyline points="0,50 20,60 40,50"/>
    </g>
</svg>"#;

#[test]
fn test_svg_to_instructions_and_back() {
    let drawing = SvgSegmenter::segment(ARTWORK, LayerResolveMode::Inkscape).unwrap();
    assert_eq!(drawing.layers.len(), 2);
    assert_eq!(drawing.width, 100.0);

    let config = PlotConfig::default();
    let (transformed, improvements) =
        Pipeline::apply_with_improvements(&config.pipeline_options(), &drawing.layers);
    // simplification plus merging should not add anything
    assert!(improvements.points <= 0.0);

    let instructions = encode(&transformed);
    assert!(instructions.starts_with("M1\nH\n"));
    assert!(instructions.trim_end().ends_with("M0"));
    assert!(instructions.contains("S outline"));
    assert!(instructions.contains("S detail"));
    for line in instructions.lines() {
        assert!(line.len() <= 29);
    }

    let decoded = decode(&instructions);
    assert_eq!(decoded.len(), transformed.len());
    for (sent, received) in transformed.iter().zip(&decoded) {
        assert_eq!(sent.segments.len(), received.segments.len());
        assert_eq!(sent.point_count(), received.point_count());
    }

    let mut tracker = ProgressTracker::new();
    tracker.set_layers(decoded);
    assert_eq!(tracker.percent_at(0), 0.0);
    assert_eq!(tracker.percent_at(instructions.lines().count()), 100.0);
}

#[test]
fn test_convert_writes_round_trippable_file() {
    let dir = tempfile::tempdir().unwrap();
    let svg_path = dir.path().join("art.svg");
    let out_path = dir.path().join("art.txt");
    std::fs::write(&svg_path, ARTWORK).unwrap();

    let svg = std::fs::read_to_string(&svg_path).unwrap();
    let drawing = SvgSegmenter::segment(&svg, LayerResolveMode::None).unwrap();
    let transformed = Pipeline::apply(&PlotConfig::default().pipeline_options(), &drawing.layers);
    std::fs::write(&out_path, encode(&transformed)).unwrap();

    let text = std::fs::read_to_string(&out_path).unwrap();
    let layers = decode(&text);
    assert_eq!(layers.len(), 1);
    assert!(layers[0].point_count() > 0);
}
