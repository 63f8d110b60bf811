use std::io::Write;
use std::path::PathBuf;

use dxfcheck_core::document::Entity;
use dxfcheck_io::{DocumentLoader, DxfFacade, IoError};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_floor_plan_fixture() {
    let loader = DxfFacade::new();
    let doc = loader.load(&fixture("floor_plan.dxf")).expect("读取 DXF 失败");

    // 楼层、两个空间、两个空间编号、工位、工位编号、区域、构造线
    assert_eq!(doc.entity_count(), 9);

    let extents = doc.header_extents().expect("头部应包含图纸范围");
    assert!((extents.min().x() - 0.0).abs() < 1e-9);
    assert!((extents.max().x() - 100.0).abs() < 1e-9);
    assert!((extents.max().y() - 50.0).abs() < 1e-9);

    for layer in [
        "Planon_floor",
        "Planon_space",
        "Planon_space_number",
        "Planon_workspace",
        "Planon_workspace_number",
        "Planon_zone",
        "Planon_construction",
    ] {
        assert!(doc.has_layer_ignore_case(layer), "缺少图层 {layer}");
    }

    let kinds: Vec<&str> = doc.entities().map(|(_, entity)| entity.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "LWPOLYLINE",
            "LWPOLYLINE",
            "LWPOLYLINE",
            "TEXT",
            "TEXT",
            "POLYLINE",
            "TEXT",
            "LWPOLYLINE",
            "LINE",
        ]
    );
}

#[test]
fn classic_polyline_collects_vertices_until_seqend() {
    let loader = DxfFacade::new();
    let doc = loader.load(&fixture("floor_plan.dxf")).expect("读取 DXF 失败");

    let mut polylines = doc.entities().filter_map(|(_, entity)| match entity {
        Entity::Polyline(polyline) => Some(polyline),
        _ => None,
    });
    let polyline = polylines.next().expect("未找到 POLYLINE 实体");
    assert!(polylines.next().is_none(), "期望仅有一个 POLYLINE 实体");

    assert_eq!(polyline.layer, "Planon_workspace");
    assert!(polyline.is_closed);
    assert_eq!(polyline.vertices.len(), 4);
    assert!((polyline.vertices[1].x() - 20.0).abs() < 1e-9);
    assert!((polyline.vertices[1].y() - 5.0).abs() < 1e-9);
}

#[test]
fn lwpolyline_closed_flag_and_text_content() {
    let loader = DxfFacade::new();
    let doc = loader.load(&fixture("floor_plan.dxf")).expect("读取 DXF 失败");

    let floor = doc
        .entities()
        .find_map(|(_, entity)| match entity {
            Entity::LwPolyline(polyline) if polyline.layer == "Planon_floor" => Some(polyline),
            _ => None,
        })
        .expect("未找到楼层多段线");
    assert!(floor.is_closed);
    assert_eq!(floor.vertices.len(), 4);

    let labels: Vec<&str> = doc
        .entities()
        .filter_map(|(_, entity)| entity.as_text())
        .filter(|text| text.layer == "Planon_space_number")
        .map(|text| text.content.as_str())
        .collect();
    assert_eq!(labels, vec!["101", "102"]);
}

#[test]
fn unknown_entities_become_other_with_layer() {
    let source = "  0\nSECTION\n  2\nENTITIES\n  0\nCIRCLE\n  8\nPlanon_zone\n 10\n1.0\n 20\n2.0\n 40\n3.0\n  0\nINSERT\n  2\nDOOR\n 10\n0.0\n 20\n0.0\n  0\nENDSEC\n  0\nEOF\n";
    let doc = DxfFacade::new().parse_str(source).expect("解析失败");
    let entities: Vec<_> = doc.entities().map(|(_, e)| e).collect();
    assert_eq!(entities.len(), 2);
    match entities[0] {
        Entity::Other(other) => {
            assert_eq!(other.kind, "CIRCLE");
            assert_eq!(other.layer, "Planon_zone");
        }
        other => panic!("expected other entity, got {other:?}"),
    }
    assert_eq!(entities[1].layer_name(), "0");
    assert!(doc.header_extents().is_none());
}

#[test]
fn layers_referenced_only_by_entities_are_defined() {
    let source = "  0\nSECTION\n  2\nENTITIES\n  0\nTEXT\n  8\nplanon_space_number\n 10\n1.0\n 20\n2.0\n  1\n101\n  0\nENDSEC\n  0\nEOF\n";
    let doc = DxfFacade::new().parse_str(source).expect("解析失败");
    assert!(doc.has_layer_ignore_case("Planon_space_number"));
}

#[test]
fn unset_header_extents_are_ignored() {
    let source = "  0\nSECTION\n  2\nHEADER\n  9\n$EXTMIN\n 10\n1e20\n 20\n1e20\n  9\n$EXTMAX\n 10\n-1e20\n 20\n-1e20\n  0\nENDSEC\n  0\nEOF\n";
    let doc = DxfFacade::new().parse_str(source).expect("解析失败");
    assert!(doc.header_extents().is_none());
}

#[test]
fn lwpolyline_with_dangling_coordinate_is_invalid() {
    let source = "  0\nSECTION\n  2\nENTITIES\n  0\nLWPOLYLINE\n  8\nPlanon_space\n 10\n1.0\n 20\n2.0\n 10\n3.0\n  0\nENDSEC\n  0\nEOF\n";
    let err = DxfFacade::new().parse_str(source).unwrap_err();
    assert!(matches!(err, IoError::InvalidDocument(_)), "unexpected error: {err}");
}

#[test]
fn binary_dxf_is_unsupported() {
    let err = DxfFacade::new()
        .parse_str("AutoCAD Binary DXF\r\n\u{1a}\0")
        .unwrap_err();
    assert!(matches!(err, IoError::UnsupportedFeature(_)));
}

#[test]
fn missing_file_reports_read_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let err = DxfFacade::new()
        .load(&dir.path().join("absent.dxf"))
        .unwrap_err();
    assert!(matches!(err, IoError::ReadError { .. }));
}

#[test]
fn non_utf8_bytes_are_tolerated() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(b"  0\nSECTION\n  2\nENTITIES\n  0\nTEXT\n  8\nPlanon_space_number\n 10\n0.0\n 20\n0.0\n  1\nRaum \xe4\n  0\nENDSEC\n  0\nEOF\n")
        .expect("write temp file");
    let doc = DxfFacade::new().load(file.path()).expect("解析失败");
    let text = doc
        .entities()
        .find_map(|(_, entity)| entity.as_text())
        .expect("未找到 TEXT");
    assert!(text.content.starts_with("Raum "));
}

#[test]
fn paper_space_entities_stay_out_of_the_document() {
    let source = "  0\nSECTION\n  2\nENTITIES\n  0\nLWPOLYLINE\n  8\nPlanon_space\n 90\n3\n 70\n1\n 10\n0.0\n 20\n0.0\n 10\n4.0\n 20\n0.0\n 10\n4.0\n 20\n4.0\n  0\nLWPOLYLINE\n  8\nPlanon_space\n 67\n1\n 90\n3\n 70\n1\n 10\n1.0\n 20\n1.0\n 10\n5.0\n 20\n1.0\n 10\n5.0\n 20\n5.0\n  0\nTEXT\n  8\nTitle_block\n 67\n1\n 10\n0.0\n 20\n0.0\n  1\nSheet 1\n  0\nTEXT\n  8\nPlanon_space_number\n 67\n0\n 10\n2.0\n 20\n1.0\n  1\n101\n  0\nENDSEC\n  0\nEOF\n";
    let doc = DxfFacade::new().parse_str(source).expect("解析失败");
    assert_eq!(doc.entity_count(), 2);
    assert_eq!(doc.paper_space_entity_count(), 2);
    let kinds: Vec<&str> = doc.entities().map(|(_, e)| e.kind()).collect();
    assert_eq!(kinds, vec!["LWPOLYLINE", "TEXT"]);
    assert!(doc.has_layer_ignore_case("Title_block"));
}

#[test]
fn paper_space_classic_polyline_skips_its_vertices() {
    let source = "  0\nSECTION\n  2\nENTITIES\n  0\nPOLYLINE\n  8\nViewport_frame\n 67\n1\n 66\n1\n 70\n1\n  0\nVERTEX\n  8\nViewport_frame\n 10\n0.0\n 20\n0.0\n  0\nVERTEX\n  8\nViewport_frame\n 10\n1.0\n 20\n0.0\n  0\nSEQEND\n  0\nCIRCLE\n  8\n0\n 10\n0.0\n 20\n0.0\n 40\n1.0\n  0\nENDSEC\n  0\nEOF\n";
    let doc = DxfFacade::new().parse_str(source).expect("解析失败");
    assert_eq!(doc.entity_count(), 1);
    assert_eq!(doc.paper_space_entity_count(), 1);
}

#[test]
fn text_without_content_is_empty() {
    let source = "  0\nSECTION\n  2\nENTITIES\n  0\nTEXT\n  8\nPlanon_workspace_number\n 10\n1.0\n 20\n2.0\n  0\nENDSEC\n  0\nEOF\n";
    let doc = DxfFacade::new().parse_str(source).expect("解析失败");
    let text = doc
        .entities()
        .find_map(|(_, entity)| entity.as_text())
        .expect("未找到 TEXT");
    assert_eq!(text.content, "");
}
