use eframe::egui::{self, Color32, Pos2, Rect, Stroke, Ui, Vec2};
use eframe::egui::epaint::TextShape;
use voromap_core::export;
use voromap_core::geometry::Point;
use voromap_core::layout::{self, LabelArc, LABEL_RADIUS, MARGIN, VIEW_SIZE};
use voromap_core::NodeKind;

use crate::state::AppState;

const LEAF_FILL: Color32 = Color32::from_rgb(0x4e, 0x79, 0xa7);
const LEAF_FILL_ACTIVE: Color32 = Color32::from_rgb(0x7a, 0xa6, 0xd2);
const OUTLINE: Color32 = Color32::WHITE;
const TOOLTIP_BG: Color32 = Color32::from_rgba_premultiplied(20, 20, 20, 230);

pub fn draw(app: &mut AppState, ctx: &egui::Context) {
    if app.poll_load() || app.load_rx.is_some() {
        ctx.request_repaint();
    }

    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        top_bar(ui, app);
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        if let Some(err) = &app.error {
            ui.colored_label(ui.visuals().error_fg_color, err);
        }
        if app.layout.is_some() {
            chart(ui, app);
        } else if app.load_rx.is_some() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading…");
            });
        } else if app.error.is_none() {
            ui.label("Open a CSV (symbol, name, marketcap, country) to render the chart");
        }
    });
}

fn top_bar(ui: &mut Ui, app: &mut AppState) {
    ui.horizontal(|ui| {
        if ui.button("Open CSV…").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("CSV", &["csv"])
                .pick_file()
            {
                app.open(path);
            }
        }
        ui.separator();
        ui.label("Seed:");
        let mut seed = app.seed;
        ui.add(egui::DragValue::new(&mut seed));
        if seed != app.seed {
            app.seed = seed;
            app.relayout();
        }
        if app.layout.is_some() {
            ui.separator();
            if ui.button("Export SVG").clicked() {
                if let Err(e) = export_svg(app) {
                    app.error = Some(e.to_string());
                }
            }
            if ui.button("Export JSON").clicked() {
                if let Err(e) = export_json(app) {
                    app.error = Some(e.to_string());
                }
            }
        }
    });
}

fn export_svg(app: &AppState) -> anyhow::Result<()> {
    let Some(layout) = &app.layout else {
        return Ok(());
    };
    if let Some(path) = rfd::FileDialog::new()
        .add_filter("SVG", &["svg"])
        .save_file()
    {
        export::save_svg(layout, &path)?;
    }
    Ok(())
}

fn export_json(app: &AppState) -> anyhow::Result<()> {
    let Some(layout) = &app.layout else {
        return Ok(());
    };
    if let Some(path) = rfd::FileDialog::new()
        .add_filter("JSON", &["json"])
        .save_file()
    {
        std::fs::write(path, serde_json::to_string_pretty(&export::to_json(layout))?)?;
    }
    Ok(())
}

fn chart(ui: &mut Ui, app: &mut AppState) {
    let hover = app.hover;
    let value_format = app.value_format;
    let csv_path = app.csv_path.clone();
    let Some(chart) = app.layout.as_ref() else {
        return;
    };

    let side = ui.available_size().min_elem();
    let (response, painter) = ui.allocate_painter(Vec2::splat(side), egui::Sense::hover());
    let rect = response.rect;
    let scale = side / VIEW_SIZE as f32;
    let center = rect.center();
    let to_screen =
        |p: Point| Pos2::new(center.x + p.x as f32 * scale, center.y + p.y as f32 * scale);
    let to_chart = |pos: Pos2| {
        Point::new(
            ((pos.x - center.x) / scale) as f64,
            ((pos.y - center.y) / scale) as f64,
        )
    };

    // resolve hover before painting so the active fill is current
    let pointer = response.hover_pos();
    let hovered = pointer.and_then(|pos| chart.leaf_at(to_chart(pos)));
    let new_hover = match (hovered, pointer) {
        (Some(leaf), Some(pos)) => {
            let node = chart.hierarchy.node(leaf);
            let lines = [
                value_format(node.value),
                node.name.clone(),
                chart.hierarchy.group_of(leaf).to_string(),
            ];
            let tooltip_size = measure_tooltip(&painter, &lines);
            let local = pos - rect.min;
            hover.hover(
                leaf,
                (local.x, local.y),
                tooltip_size,
                (rect.width(), rect.height()),
            )
        }
        _ => hover.leave(),
    };

    // polygon layer, in hierarchy order; the root shape is invisible
    for node in &chart.hierarchy.nodes {
        if node.kind == NodeKind::Root {
            continue;
        }
        let Some(polygon) = &node.polygon else { continue };
        let points: Vec<Pos2> = polygon.0.iter().map(|p| to_screen(*p)).collect();
        let fill = if layout::fills(node.kind) {
            if new_hover.active == Some(node.id) {
                LEAF_FILL_ACTIVE
            } else {
                LEAF_FILL
            }
        } else {
            Color32::TRANSPARENT
        };
        let stroke = Stroke::new(layout::stroke_weight(node.depth) * scale, OUTLINE);
        painter.add(egui::Shape::convex_polygon(points, fill, stroke));
    }

    // curved group labels riding just outside the chart
    let label_color = ui.visuals().strong_text_color();
    let font = egui::FontId::proportional((MARGIN as f32 / 2.0) * scale);
    for group in chart.hierarchy.groups() {
        let Some(site) = group.site else { continue };
        let arc = LabelArc::around(site, LABEL_RADIUS);
        paint_arc_text(&painter, &arc, &group.name, &font, label_color, scale, to_screen);
    }

    // leaf icons centered on their sites, capped and sub-linear in value
    for leaf in chart.hierarchy.leaves() {
        let (Some(site), Some(icon)) = (leaf.site, leaf.icon.as_ref()) else {
            continue;
        };
        let size = layout::icon_size(leaf.value) as f32 * scale;
        if size < 1.0 {
            continue;
        }
        let icon_rect = Rect::from_center_size(to_screen(site), Vec2::splat(size));
        egui::Image::new(crate::state::icon_uri(csv_path.as_deref(), icon))
            .paint_at(ui, icon_rect);
    }

    // tooltip goes on top of everything
    if let (Some(leaf), Some(pos)) = (new_hover.active, new_hover.tooltip_pos) {
        let node = chart.hierarchy.node(leaf);
        let lines = [
            value_format(node.value),
            node.name.clone(),
            chart.hierarchy.group_of(leaf).to_string(),
        ];
        let tooltip_size = measure_tooltip(&painter, &lines);
        draw_tooltip(&painter, rect, Some(pos), tooltip_size, &lines);
    }

    app.hover = new_hover;
}

const TOOLTIP_PAD: f32 = 8.0;
const TOOLTIP_FONT: f32 = 14.0;

fn measure_tooltip(painter: &egui::Painter, lines: &[String; 3]) -> (f32, f32) {
    let font = egui::FontId::proportional(TOOLTIP_FONT);
    let mut w: f32 = 0.0;
    let mut h: f32 = 0.0;
    for line in lines {
        let galley = painter.layout_no_wrap(line.clone(), font.clone(), Color32::WHITE);
        w = w.max(galley.size().x);
        h += galley.size().y;
    }
    (w + 2.0 * TOOLTIP_PAD, h + 2.0 * TOOLTIP_PAD)
}

fn draw_tooltip(
    painter: &egui::Painter,
    surface: Rect,
    pos: Option<(f32, f32)>,
    size: (f32, f32),
    lines: &[String; 3],
) {
    let Some((tx, ty)) = pos else { return };
    let min = surface.min + Vec2::new(tx, ty);
    let tip_rect = Rect::from_min_size(min, Vec2::new(size.0, size.1));
    painter.rect_filled(tip_rect, 4.0, TOOLTIP_BG);
    let font = egui::FontId::proportional(TOOLTIP_FONT);
    let mut cursor = min + Vec2::splat(TOOLTIP_PAD);
    for line in lines {
        let galley = painter.layout_no_wrap(line.clone(), font.clone(), Color32::WHITE);
        let advance = galley.size().y;
        painter.galley(cursor, galley, Color32::WHITE);
        cursor.y += advance;
    }
}

/// Place a label glyph by glyph along the arc, centered at its midpoint,
/// each glyph rotated to follow the local tangent.
fn paint_arc_text(
    painter: &egui::Painter,
    arc: &LabelArc,
    text: &str,
    font: &egui::FontId,
    color: Color32,
    scale: f32,
    to_screen: impl Fn(Point) -> Pos2,
) {
    let arc_len = arc.arc_length() as f32 * scale;
    if arc_len <= 0.0 {
        return;
    }
    let glyphs: Vec<_> = text
        .chars()
        .map(|ch| painter.layout_no_wrap(ch.to_string(), font.clone(), color))
        .collect();
    let total: f32 = glyphs.iter().map(|g| g.size().x).sum();
    let mut offset = (arc_len - total) / 2.0;
    for galley in glyphs {
        let glyph_w = galley.size().x;
        let t = ((offset + glyph_w / 2.0) / arc_len).clamp(0.0, 1.0) as f64;
        let anchor = to_screen(arc.point_at(t));
        let angle = arc.tangent_at(t) as f32;
        let rot = egui::emath::Rot2::from_angle(angle);
        let half = Vec2::new(glyph_w / 2.0, galley.size().y / 2.0);
        let pos = anchor - rot * half;
        painter.add(TextShape::new(pos, galley, color).with_angle(angle));
        offset += glyph_w;
    }
}
