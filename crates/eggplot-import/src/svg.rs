//! SVG document traversal and layer resolution.
//!
//! Walks an SVG element tree depth-first, composing per-element transform
//! matrices, synthesizing path data for the basic shapes, and grouping the
//! segmented strokes into layers according to the configured
//! [`LayerResolveMode`].

use crate::path::PathSegmenter;
use eggplot_core::{ImportError, Layer, LayerResolveMode, Point, Segment};
use roxmltree::{Document, Node};
use svgtypes::{TransformListParser, TransformListToken};
use tracing::debug;

const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";

/// A segmented SVG document: layers plus the source dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    /// Layers in discovery order
    pub layers: Vec<Layer>,
    /// Document width (user units)
    pub width: f64,
    /// Document height (user units)
    pub height: f64,
}

/// 2D affine transform in SVG matrix form (a b c d e f).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// `self * other`, i.e. `other` applied first.
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    fn apply(&self, p: &mut Point) {
        let (x, y) = (p.x, p.y);
        p.x = self.a * x + self.c * y + self.e;
        p.y = self.b * x + self.d * y + self.f;
    }

    /// Consolidate a `transform` attribute value into a single matrix.
    fn parse(transform: &str) -> Option<Matrix> {
        let mut matrix = Matrix::IDENTITY;
        let mut any = false;
        for token in TransformListParser::from(transform) {
            let token = match token {
                Ok(token) => token,
                Err(err) => {
                    debug!("skipping malformed transform list: {err}");
                    return None;
                }
            };
            let next = match token {
                TransformListToken::Matrix { a, b, c, d, e, f } => Matrix { a, b, c, d, e, f },
                TransformListToken::Translate { tx, ty } => Matrix {
                    e: tx,
                    f: ty,
                    ..Matrix::IDENTITY
                },
                TransformListToken::Scale { sx, sy } => Matrix {
                    a: sx,
                    d: sy,
                    ..Matrix::IDENTITY
                },
                TransformListToken::Rotate { angle } => {
                    let (s, c) = angle.to_radians().sin_cos();
                    Matrix {
                        a: c,
                        b: s,
                        c: -s,
                        d: c,
                        e: 0.0,
                        f: 0.0,
                    }
                }
                TransformListToken::SkewX { angle } => Matrix {
                    c: angle.to_radians().tan(),
                    ..Matrix::IDENTITY
                },
                TransformListToken::SkewY { angle } => Matrix {
                    b: angle.to_radians().tan(),
                    ..Matrix::IDENTITY
                },
            };
            matrix = matrix.multiply(&next);
            any = true;
        }
        any.then_some(matrix)
    }
}

/// Insertion-ordered accumulation of layer id → strokes.
#[derive(Default)]
struct LayerMap {
    entries: Vec<(Option<String>, Vec<Segment>)>,
}

impl LayerMap {
    fn append(&mut self, id: Option<&str>, segments: Vec<Segment>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k.as_deref() == id) {
            entry.1.extend(segments);
        } else {
            self.entries.push((id.map(str::to_string), segments));
        }
    }

    fn into_layers(self) -> Vec<Layer> {
        self.entries
            .into_iter()
            .map(|(id, segments)| {
                let mut layer = Layer::new(id);
                layer.segments = segments;
                layer
            })
            .collect()
    }
}

/// Segments a whole SVG document into layers of pen strokes.
#[derive(Debug)]
pub struct SvgSegmenter;

impl SvgSegmenter {
    /// Segment SVG text into a [`Drawing`].
    ///
    /// Fails with [`ImportError::InvalidDocument`] when the source is not a
    /// parseable SVG document. Unsupported drawing constructs inside a valid
    /// document are skipped, never fatal.
    pub fn segment(svg_text: &str, mode: LayerResolveMode) -> Result<Drawing, ImportError> {
        let doc = Document::parse(svg_text).map_err(|err| ImportError::InvalidDocument {
            reason: err.to_string(),
        })?;
        let root = doc.root_element();
        if root.tag_name().name() != "svg" {
            return Err(ImportError::InvalidDocument {
                reason: format!("root element is <{}>, not <svg>", root.tag_name().name()),
            });
        }

        let (width, height) = document_size(&root);

        let mut layers = LayerMap::default();
        let mut transforms = Vec::new();
        traverse(&root, &mut transforms, mode, None, &mut layers);

        Ok(Drawing {
            layers: layers.into_layers(),
            width,
            height,
        })
    }
}

/// Depth-first walk accumulating the transform stack and layer context.
fn traverse(
    root: &Node<'_, '_>,
    transforms: &mut Vec<Matrix>,
    mode: LayerResolveMode,
    inherited_id: Option<&str>,
    layers: &mut LayerMap,
) {
    for child in root.children().filter(Node::is_element) {
        if child.tag_name().name() == "defs" {
            continue;
        }

        let pushed = child
            .attribute("transform")
            .and_then(Matrix::parse)
            .map(|m| transforms.push(m))
            .is_some();

        let layer_id = resolve_layer_id(&child, mode);
        let layer_id = layer_id.as_deref().or(inherited_id);

        if child.children().any(|n| n.is_element()) {
            traverse(&child, transforms, mode, layer_id, layers);
        } else if let Some(path_data) = synthesize_path_data(&child) {
            let mut segments = PathSegmenter::segment(&path_data);
            let matrix = transforms
                .iter()
                .fold(Matrix::IDENTITY, |acc, m| acc.multiply(m));
            for segment in &mut segments {
                for point in &mut segment.points {
                    matrix.apply(point);
                }
            }
            layers.append(layer_id, segments);
        }

        if pushed {
            transforms.pop();
        }
    }
}

/// Produce equivalent path data for a drawable leaf element.
fn synthesize_path_data(node: &Node<'_, '_>) -> Option<String> {
    let attr = |name: &str| node.attribute(name).and_then(|v| v.trim().parse::<f64>().ok());
    match node.tag_name().name() {
        "path" => node.attribute("d").map(str::to_string),
        "rect" => {
            let x = attr("x").unwrap_or(0.0);
            let y = attr("y").unwrap_or(0.0);
            let w = attr("width")?;
            let h = attr("height")?;
            Some(format!("M {x},{y} h {w} v {h} h {} z", -w))
        }
        "circle" | "ellipse" => {
            let rx = attr("rx").or_else(|| attr("r"))?;
            let ry = attr("ry").or_else(|| attr("r"))?;
            let cx = attr("cx").unwrap_or(0.0);
            let cy = attr("cy").unwrap_or(0.0);
            let x1 = cx - rx;
            let x2 = cx + rx;
            Some(format!(
                "M {x1},{cy} A {rx},{ry} 0 1 0 {x2},{cy} A {rx},{ry} 0 1 0 {x1},{cy}"
            ))
        }
        "line" => {
            let x1 = attr("x1").unwrap_or(0.0);
            let y1 = attr("y1").unwrap_or(0.0);
            let x2 = attr("x2").unwrap_or(0.0);
            let y2 = attr("y2").unwrap_or(0.0);
            Some(format!("M {x1},{y1} {x2},{y2}"))
        }
        "polyline" | "polygon" => {
            let points = node.attribute("points")?;
            let closer = if node.tag_name().name() == "polygon" {
                "Z"
            } else {
                ""
            };
            Some(format!("M {points}{closer}"))
        }
        _ => None,
    }
}

/// Resolve the layer id for one element under the configured mode.
fn resolve_layer_id(node: &Node<'_, '_>, mode: LayerResolveMode) -> Option<String> {
    match mode {
        LayerResolveMode::None => None,
        LayerResolveMode::Color => stroke_color(node),
        LayerResolveMode::Inkscape => {
            if node.attribute((INKSCAPE_NS, "groupmode")) == Some("layer") {
                node.attribute((INKSCAPE_NS, "label")).map(str::to_string)
            } else {
                None
            }
        }
    }
}

/// The element's stroke color: inline `style` first, then the presentation
/// attribute. `none` counts as no stroke.
fn stroke_color(node: &Node<'_, '_>) -> Option<String> {
    if let Some(style) = node.attribute("style") {
        for declaration in style.split(';') {
            if let Some((key, value)) = declaration.split_once(':') {
                if key.trim() == "stroke" {
                    let value = value.trim();
                    if !value.is_empty() && value != "none" {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }
    node.attribute("stroke")
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "none")
        .map(str::to_string)
}

/// Document width/height from the root attributes, `viewBox` as fallback.
fn document_size(root: &Node<'_, '_>) -> (f64, f64) {
    let explicit = |name: &str| {
        root.attribute(name)
            .map(|v| v.trim().trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%'))
            .and_then(|v| v.parse::<f64>().ok())
    };
    let viewbox: Option<Vec<f64>> = root.attribute("viewBox").map(|v| {
        v.split([' ', ','])
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect()
    });
    let from_viewbox = |index: usize| {
        viewbox
            .as_ref()
            .and_then(|parts| parts.get(index).copied())
    };

    let width = explicit("width").or_else(|| from_viewbox(2)).unwrap_or(0.0);
    let height = explicit("height").or_else(|| from_viewbox(3)).unwrap_or(0.0);
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_document_is_fatal() {
        let err = SvgSegmenter::segment("not xml at all <", LayerResolveMode::None).unwrap_err();
        assert!(matches!(err, ImportError::InvalidDocument { .. }));

        let err = SvgSegmenter::segment("<html></html>", LayerResolveMode::None).unwrap_err();
        assert!(matches!(err, ImportError::InvalidDocument { .. }));
    }

    #[test]
    fn test_rect_becomes_closed_stroke() {
        let svg = r#"<svg width="100" height="50"><rect x="1" y="2" width="10" height="5"/></svg>"#;
        let drawing = SvgSegmenter::segment(svg, LayerResolveMode::None).unwrap();
        assert_eq!(drawing.width, 100.0);
        assert_eq!(drawing.height, 50.0);
        assert_eq!(drawing.layers.len(), 1);
        let points: Vec<(f64, f64)> = drawing.layers[0].segments[0]
            .points
            .iter()
            .map(|p| (p.x, p.y))
            .collect();
        assert_eq!(
            points,
            vec![(1.0, 2.0), (11.0, 2.0), (11.0, 7.0), (1.0, 7.0), (1.0, 2.0)]
        );
    }

    #[test]
    fn test_transforms_compose_down_the_tree() {
        let svg = r#"<svg><g transform="translate(10,20)"><line x1="0" y1="0" x2="5" y2="0" transform="scale(2)"/></g></svg>"#;
        let drawing = SvgSegmenter::segment(svg, LayerResolveMode::None).unwrap();
        let points: Vec<(f64, f64)> = drawing.layers[0].segments[0]
            .points
            .iter()
            .map(|p| (p.x, p.y))
            .collect();
        assert_eq!(points, vec![(10.0, 20.0), (20.0, 20.0)]);
    }

    #[test]
    fn test_defs_are_skipped() {
        let svg = r#"<svg><defs><rect x="0" y="0" width="5" height="5"/></defs><line x1="0" y1="0" x2="1" y2="1"/></svg>"#;
        let drawing = SvgSegmenter::segment(svg, LayerResolveMode::None).unwrap();
        assert_eq!(drawing.layers.len(), 1);
        assert_eq!(drawing.layers[0].segments.len(), 1);
    }

    #[test]
    fn test_color_mode_groups_by_stroke() {
        let svg = r#"<svg>
            <line x1="0" y1="0" x2="1" y2="0" style="stroke: red"/>
            <line x1="0" y1="1" x2="1" y2="1" stroke="blue"/>
            <line x1="0" y1="2" x2="1" y2="2" style="fill:none; stroke:red"/>
            <line x1="0" y1="3" x2="1" y2="3"/>
        </svg>"#;
        let drawing = SvgSegmenter::segment(svg, LayerResolveMode::Color).unwrap();
        let ids: Vec<Option<&str>> = drawing.layers.iter().map(|l| l.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("red"), Some("blue"), None]);
        assert_eq!(drawing.layers[0].segments.len(), 2);
        assert_eq!(drawing.layers[2].description, eggplot_core::NO_NAME);
    }

    #[test]
    fn test_color_inherited_from_ancestor() {
        let svg = r#"<svg><g stroke="green"><line x1="0" y1="0" x2="1" y2="0"/></g></svg>"#;
        let drawing = SvgSegmenter::segment(svg, LayerResolveMode::Color).unwrap();
        assert_eq!(drawing.layers[0].id.as_deref(), Some("green"));
    }

    #[test]
    fn test_inkscape_layer_groups() {
        let svg = r#"<svg xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
            <g inkscape:groupmode="layer" inkscape:label="outline">
                <line x1="0" y1="0" x2="1" y2="0"/>
            </g>
            <line x1="0" y1="1" x2="1" y2="1"/>
        </svg>"#;
        let drawing = SvgSegmenter::segment(svg, LayerResolveMode::Inkscape).unwrap();
        let ids: Vec<Option<&str>> = drawing.layers.iter().map(|l| l.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("outline"), None]);
    }

    #[test]
    fn test_circle_becomes_two_arcs() {
        let svg = r#"<svg><circle cx="10" cy="10" r="5"/></svg>"#;
        let drawing = SvgSegmenter::segment(svg, LayerResolveMode::None).unwrap();
        let points = &drawing.layers[0].segments[0].points;
        assert!(points.len() > 8);
        for p in points {
            let dist = ((p.x - 10.0).powi(2) + (p.y - 10.0).powi(2)).sqrt();
            assert!((dist - 5.0).abs() < 0.3, "point {p} off the circle");
        }
    }

    #[test]
    fn test_polygon_closes() {
        let svg = r#"<svg><polygon points="0,0 4,0 4,4"/></svg>"#;
        let drawing = SvgSegmenter::segment(svg, LayerResolveMode::None).unwrap();
        let points = &drawing.layers[0].segments[0].points;
        assert_eq!(points.len(), 4);
        assert_eq!((points[3].x, points[3].y), (0.0, 0.0));
    }

    #[test]
    fn test_viewbox_dimensions_fallback() {
        let svg = r#"<svg viewBox="0 0 320 240"><line x1="0" y1="0" x2="1" y2="1"/></svg>"#;
        let drawing = SvgSegmenter::segment(svg, LayerResolveMode::None).unwrap();
        assert_eq!((drawing.width, drawing.height), (320.0, 240.0));
    }
}
