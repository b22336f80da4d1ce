use svg::node::element::{Image, Polygon as SvgPolygon, Text};
use svg::node::Text as TextNode;
use svg::Document;

use crate::hierarchy::NodeKind;
use crate::layout::{self, ChartLayout, LabelArc, LABEL_RADIUS, MARGIN, VIEW_SIZE};

const LEAF_FILL: &str = "#4e79a7";
const STROKE: &str = "#ffffff";

pub fn to_json(chart: &ChartLayout) -> serde_json::Value {
    serde_json::json!({
        "seed": chart.seed,
        "nodes": chart.hierarchy.nodes.iter().map(|n| serde_json::json!({
            "id": n.id.0,
            "parent": n.parent.map(|p| p.0),
            "depth": n.depth,
            "kind": match n.kind {
                NodeKind::Root => "root",
                NodeKind::Group => "group",
                NodeKind::Leaf => "leaf",
            },
            "key": n.key,
            "name": n.name,
            "value": n.value,
            "polygon": n.polygon.as_ref().map(|p| {
                p.0.iter().map(|pt| [pt.x, pt.y]).collect::<Vec<_>>()
            }),
            "site": n.site.map(|s| [s.x, s.y]),
        })).collect::<Vec<_>>(),
    })
}

pub fn save_svg(chart: &ChartLayout, path: &std::path::Path) -> std::io::Result<()> {
    svg::save(path, &to_svg(chart))
}

/// One row per leaf: identity, group, value and where its cell ended up.
pub fn to_csv(chart: &ChartLayout, mut w: impl std::io::Write) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record(["symbol", "name", "group", "value", "area", "site_x", "site_y"])?;
    for leaf in chart.hierarchy.leaves() {
        let area = leaf.polygon.as_ref().map(|p| p.area()).unwrap_or(0.0);
        let site = leaf.site.unwrap_or_default();
        writer.write_record([
            leaf.key.clone(),
            leaf.name.clone(),
            chart.hierarchy.group_of(leaf.id).to_string(),
            leaf.value.to_string(),
            format!("{area:.2}"),
            format!("{:.2}", site.x),
            format!("{:.2}", site.y),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the chart as a standalone SVG document: polygon layer, rotated
/// group labels on their arc midpoints, and leaf icons sized by value.
pub fn to_svg(chart: &ChartLayout) -> Document {
    let half = VIEW_SIZE / 2.0;
    let mut document = Document::new()
        .set(
            "viewBox",
            format!("{} {} {} {}", -half, -half, VIEW_SIZE, VIEW_SIZE),
        )
        .set("width", VIEW_SIZE)
        .set("height", VIEW_SIZE)
        .set("xmlns", "http://www.w3.org/2000/svg");

    for node in &chart.hierarchy.nodes {
        let Some(polygon) = &node.polygon else { continue };
        let points = polygon
            .0
            .iter()
            .map(|p| format!("{:.2},{:.2}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");
        let fill = if layout::fills(node.kind) {
            LEAF_FILL
        } else {
            "none"
        };
        document = document.add(
            SvgPolygon::new()
                .set("points", points)
                .set("fill", fill)
                .set("stroke", STROKE)
                .set("stroke-width", layout::stroke_weight(node.depth)),
        );
    }

    for group in chart.hierarchy.groups() {
        let Some(site) = group.site else { continue };
        let arc = LabelArc::around(site, LABEL_RADIUS);
        let mid = arc.point_at(0.5);
        let angle = arc.tangent_at(0.5).to_degrees();
        document = document.add(
            Text::new("")
                .set("x", mid.x)
                .set("y", mid.y)
                .set("text-anchor", "middle")
                .set("dy", "0.32em")
                .set("font-size", MARGIN / 2.0)
                .set(
                    "transform",
                    format!("rotate({angle:.2} {:.2} {:.2})", mid.x, mid.y),
                )
                .add(TextNode::new(group.name.clone())),
        );
    }

    for leaf in chart.hierarchy.leaves() {
        let (Some(site), Some(icon)) = (leaf.site, leaf.icon.as_ref()) else {
            continue;
        };
        let size = layout::icon_size(leaf.value);
        if size <= 0.0 {
            continue;
        }
        document = document.add(
            Image::new()
                .set("href", icon.as_str())
                .set("x", site.x - size / 2.0)
                .set("y", site.y - size / 2.0)
                .set("width", size)
                .set("height", size),
        );
    }

    document
}
