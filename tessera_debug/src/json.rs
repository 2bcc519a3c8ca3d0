// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of built display lists.
//!
//! [`export`] writes a [`DisplayList`] as one JSON object: the list's summary
//! flags and bounds, and an `ops` array with one entry per record. Each entry
//! carries the record's index, byte offset, size and kind, plus the scalar
//! arguments of common ops. Shared objects (images, filters, nested lists)
//! are not expanded.

use std::io::{self, Write};

use kurbo::{Point, Rect};
use serde_json::{Map, Value, json};

use tessera_core::buffer::DlOpEntry;
use tessera_core::display_list::DisplayList;
use tessera_core::op::DlOp;

/// Exports `list` as pretty-printed JSON.
pub fn export(list: &DisplayList, writer: &mut dyn Write) -> io::Result<()> {
    write_value(&to_value(list, list.iter()), writer)
}

/// Exports the records of `list` that may draw inside `cull_rect`.
///
/// The summary fields describe the whole list.
pub fn export_culled(
    list: &DisplayList,
    cull_rect: &Rect,
    writer: &mut dyn Write,
) -> io::Result<()> {
    write_value(&to_value(list, list.iter_culled(cull_rect)), writer)
}

fn write_value(value: &Value, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)
}

fn to_value<'a>(list: &'a DisplayList, ops: impl Iterator<Item = DlOpEntry<'a>>) -> Value {
    let ops: Vec<Value> = ops.map(|e| op_value(&e)).collect();
    json!({
        "unique_id": list.unique_id(),
        "op_count": list.op_count(false),
        "op_count_nested": list.op_count(true),
        "op_index_count": list.total_op_index_count(),
        "bytes": list.bytes(false),
        "bytes_nested": list.bytes(true),
        "bounds": rect(&list.bounds()),
        "has_rtree": list.rtree().is_some(),
        "can_apply_group_opacity": list.can_apply_group_opacity(),
        "is_ui_thread_safe": list.is_ui_thread_safe(),
        "modifies_transparent_black": list.modifies_transparent_black(),
        "root_has_backdrop_filter": list.root_has_backdrop_filter(),
        "max_root_blend_mode": format!("{:?}", list.max_root_blend_mode()),
        "is_unbounded": list.is_unbounded(),
        "ops": ops,
    })
}

fn op_value(e: &DlOpEntry<'_>) -> Value {
    let mut obj = Map::new();
    obj.insert("index".into(), e.index.into());
    obj.insert("offset".into(), e.offset.into());
    obj.insert("size".into(), e.size.into());
    obj.insert("kind".into(), format!("{:?}", e.op.op_type()).into());
    if let Some(args) = op_args(&e.op) {
        obj.insert("args".into(), args);
    }
    Value::Object(obj)
}

fn rect(r: &Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

fn point(p: Point) -> Value {
    json!([p.x, p.y])
}

fn op_args(op: &DlOp<'_>) -> Option<Value> {
    let args = match op {
        DlOp::SetAntiAlias(v) | DlOp::SetDither(v) | DlOp::SetInvertColors(v) => json!(v),
        DlOp::SetStrokeWidth(v) | DlOp::SetStrokeMiter(v) => json!(v),
        DlOp::SetStrokeCap(v) => json!(format!("{v:?}")),
        DlOp::SetStrokeJoin(v) => json!(format!("{v:?}")),
        DlOp::SetStyle(v) => json!(format!("{v:?}")),
        DlOp::SetColor(c) => json!(format!("#{:08x}", c.0)),
        DlOp::SetBlendMode(m) => json!(format!("{m:?}")),
        DlOp::SetMaskFilter(Some(m)) => json!({
            "style": format!("{:?}", m.style),
            "sigma": m.sigma,
        }),
        DlOp::Save { restore_index } => json!({ "restore_index": restore_index }),
        DlOp::SaveLayer {
            options,
            restore_index,
            bounds,
            ..
        } => json!({
            "restore_index": restore_index,
            "options": options.bits(),
            "bounds": bounds.as_ref().map(rect),
        }),
        DlOp::Translate { tx, ty } => json!([tx, ty]),
        DlOp::Scale { sx, sy } | DlOp::Skew { sx, sy } => json!([sx, sy]),
        DlOp::Rotate { degrees } => json!(degrees),
        DlOp::Transform2DAffine(m) => json!(m),
        DlOp::TransformFullPerspective(m) => json!(m.as_slice()),
        DlOp::ClipRect { rect: r, is_aa, .. } | DlOp::ClipOval { bounds: r, is_aa, .. } => {
            json!({ "rect": rect(r), "is_aa": is_aa })
        }
        DlOp::ClipRRect { rrect, is_aa, .. } => {
            json!({ "rect": rect(&rrect.rect()), "is_aa": is_aa })
        }
        DlOp::ClipPath { path, is_aa, .. } => {
            json!({ "bounds": rect(&path.bounds()), "is_aa": is_aa })
        }
        DlOp::DrawColor { color, mode } => json!({
            "color": format!("#{:08x}", color.0),
            "mode": format!("{mode:?}"),
        }),
        DlOp::DrawLine { p0, p1 } => json!([point(*p0), point(*p1)]),
        DlOp::DrawRect(r) | DlOp::DrawOval(r) => rect(r),
        DlOp::DrawCircle { center, radius } => json!({
            "center": point(*center),
            "radius": radius,
        }),
        DlOp::DrawRRect(rr) => rect(&rr.rect()),
        DlOp::DrawDRRect { outer, inner } => json!({
            "outer": rect(&outer.rect()),
            "inner": rect(&inner.rect()),
        }),
        DlOp::DrawPath(path) | DlOp::DrawShadow { path, .. } => rect(&path.bounds()),
        DlOp::DrawArc {
            bounds,
            start_degrees,
            sweep_degrees,
            use_center,
        } => json!({
            "bounds": rect(bounds),
            "start": start_degrees,
            "sweep": sweep_degrees,
            "use_center": use_center,
        }),
        DlOp::DrawPoints { points, .. } => json!(points.len()),
        DlOp::DrawImage { point: p, .. } => point(*p),
        DlOp::DrawImageRect { dst, .. } | DlOp::DrawImageNine { dst, .. } => rect(dst),
        DlOp::DrawAtlas { transforms, .. } => json!(transforms.len()),
        DlOp::DrawDisplayList {
            display_list,
            opacity,
        } => json!({
            "unique_id": display_list.unique_id(),
            "opacity": opacity,
        }),
        DlOp::DrawTextBlob { x, y, .. } => json!([x, y]),
        _ => return None,
    };
    Some(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::builder::DisplayListBuilder;
    use tessera_core::color::DlColor;
    use tessera_core::paint::DlPaint;

    fn parse(out: Vec<u8>) -> Value {
        let json_str = String::from_utf8(out).unwrap();
        serde_json::from_str(&json_str).unwrap()
    }

    #[test]
    fn export_produces_valid_json() {
        let mut builder = DisplayListBuilder::default();
        builder.save();
        builder.translate(5.0, 5.0);
        builder.draw_rect_with_paint(
            &Rect::new(0.0, 0.0, 10.0, 10.0),
            &DlPaint::from_color(DlColor::RED),
        );
        builder.restore();
        let list = builder.build();

        let mut out = Vec::new();
        export(&list, &mut out).unwrap();
        let parsed = parse(out);

        assert_eq!(parsed["op_count"], 4);
        assert_eq!(parsed["bounds"], json!([5.0, 5.0, 15.0, 15.0]));
        assert_eq!(parsed["can_apply_group_opacity"], true);

        let ops = parsed["ops"].as_array().unwrap();
        let kinds: Vec<_> = ops.iter().map(|op| op["kind"].as_str().unwrap()).collect();
        assert_eq!(
            kinds,
            ["Save", "Translate", "SetColor", "DrawRect", "Restore"]
        );
        assert_eq!(ops[0]["args"]["restore_index"], 4);
        assert_eq!(ops[2]["args"], "#ffff0000");
        assert_eq!(ops[3]["args"], json!([0.0, 0.0, 10.0, 10.0]));
        assert!(ops[4].get("args").is_none(), "restore has no arguments");
        assert_eq!(ops[0]["offset"], 0);
    }

    #[test]
    fn export_culled_skips_ops_outside() {
        let mut builder = DisplayListBuilder::new(None, true);
        builder.draw_rect(&Rect::new(0.0, 0.0, 10.0, 10.0));
        builder.draw_rect(&Rect::new(100.0, 100.0, 110.0, 110.0));
        let list = builder.build();

        let mut out = Vec::new();
        export_culled(&list, &Rect::new(90.0, 90.0, 120.0, 120.0), &mut out).unwrap();
        let parsed = parse(out);
        assert_eq!(parsed["op_count"], 2, "summary covers the whole list");
        let ops = parsed["ops"].as_array().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0]["index"], 1);
    }

    #[test]
    fn export_empty_list() {
        let mut out = Vec::new();
        export(&DisplayList::default(), &mut out).unwrap();
        let parsed = parse(out);
        assert!(parsed["ops"].as_array().unwrap().is_empty());
        assert_eq!(parsed["bounds"], json!([0.0, 0.0, 0.0, 0.0]));
    }
}
