//! Region selection window
//!
//! Shows the image at the session scale and translates pointer input into
//! selection events. Display space is measured from the top-left corner of
//! the drawn image.

use crate::geometry::{compute_scale, Point, Scale, Size};
use crate::selection::{SelectionEvent, SelectionMachine, SelectionOutcome};
use anyhow::anyhow;
use egui::{Color32, Pos2, Rect, Rounding, Stroke, TextureHandle, TextureOptions, Vec2};
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use std::sync::Arc;
use tokio::sync::oneshot;

const WINDOW_TITLE: &str = "Select Region";

/// Open the selection window and block until it closes.
///
/// The window is closed by the user (cancellation) or by itself once a
/// selection has been made. A window that goes away before the selection
/// machine ever ran counts as a cancellation.
pub fn select_region(
    image: Arc<DynamicImage>,
    allow_scaling: bool,
    fallback_viewport: Size,
) -> anyhow::Result<SelectionOutcome> {
    let (tx, mut rx) = oneshot::channel();
    let image_size = native_size(&image);
    let initial = compute_scale(fallback_viewport, image_size, allow_scaling).apply(image_size);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([initial.width as f32, initial.height as f32])
            .with_resizable(false),
        ..Default::default()
    };

    let app = SelectorApp {
        image,
        allow_scaling,
        fallback_viewport,
        completion: Some(tx),
        view: None,
    };

    eframe::run_native(WINDOW_TITLE, options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow!("{}", e))?;

    Ok(rx.try_recv().unwrap_or(SelectionOutcome::Cancelled))
}

/// Everything that exists once the scale is known
struct SelectorView {
    machine: SelectionMachine,
    texture: TextureHandle,
    display_size: Vec2,
}

struct SelectorApp {
    image: Arc<DynamicImage>,
    allow_scaling: bool,
    fallback_viewport: Size,
    completion: Option<oneshot::Sender<SelectionOutcome>>,
    view: Option<SelectorView>,
}

impl SelectorApp {
    /// Fix the scale from the monitor size and build the scaled texture
    fn init_view(&mut self, ctx: &egui::Context) -> Option<&mut SelectorView> {
        if self.view.is_none() {
            let completion = self.completion.take()?;
            let monitor = ctx.input(|i| i.viewport().monitor_size);
            let viewport = viewport_size(monitor, self.fallback_viewport);
            let image_size = native_size(&self.image);
            let scale = compute_scale(viewport, image_size, self.allow_scaling);
            let shown = scale.apply(image_size);

            tracing::info!(
                "Preview {}x{} at scale {} (viewport {}x{})",
                shown.width.round(),
                shown.height.round(),
                scale,
                viewport.width,
                viewport.height
            );

            let texture = ctx.load_texture(
                "selection-preview",
                preview_image(&self.image, scale),
                TextureOptions::LINEAR,
            );
            let display_size = Vec2::new(shown.width as f32, shown.height as f32);
            ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(display_size));

            self.view = Some(SelectorView {
                machine: SelectionMachine::new(scale, completion),
                texture,
                display_size,
            });
        }
        self.view.as_mut()
    }
}

impl eframe::App for SelectorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let Some(view) = self.init_view(ctx) else {
            return;
        };

        let close_requested = ctx.input(|i| i.viewport().close_requested());

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (response, painter) = ui.allocate_painter(view.display_size, egui::Sense::drag());
                let origin = response.rect.min;

                painter.image(
                    view.texture.id(),
                    response.rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );

                let (pressed, released, down, pos) = ctx.input(|i| {
                    (
                        i.pointer.primary_pressed(),
                        i.pointer.primary_released(),
                        i.pointer.primary_down(),
                        i.pointer.interact_pos(),
                    )
                });

                let mut redraw = false;
                if let Some(pos) = pos {
                    let point = to_display_point(pos, origin);
                    if pressed {
                        redraw |= view.machine.handle(SelectionEvent::Press(point));
                    } else if down {
                        redraw |= view.machine.handle(SelectionEvent::Drag(point));
                    }
                }
                if released {
                    view.machine.handle(SelectionEvent::Release);
                }

                if let Some(selection) = view.machine.selection() {
                    let rect = Rect::from_min_size(
                        origin + Vec2::new(selection.x as f32, selection.y as f32),
                        Vec2::new(selection.width as f32, selection.height as f32),
                    );
                    painter.rect_stroke(rect, Rounding::ZERO, Stroke::new(1.5, Color32::RED));
                }

                if redraw {
                    ctx.request_repaint();
                }
            });

        if close_requested {
            view.machine.handle(SelectionEvent::Cancel);
        } else if view.machine.is_done() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

fn native_size(image: &DynamicImage) -> Size {
    let (width, height) = image.dimensions();
    Size::new(width as f64, height as f64)
}

/// Viewport to fit the preview into, preferring what the monitor reports
fn viewport_size(monitor: Option<Vec2>, fallback: Size) -> Size {
    match monitor {
        Some(size) if size.x > 0.0 && size.y > 0.0 => Size::new(size.x as f64, size.y as f64),
        _ => fallback,
    }
}

fn to_display_point(pos: Pos2, origin: Pos2) -> Point {
    let offset = pos - origin;
    Point::new(offset.x as f64, offset.y as f64)
}

/// Downscale the image to preview size and convert it for upload
fn preview_image(image: &DynamicImage, scale: Scale) -> egui::ColorImage {
    let (width, height) = image.dimensions();
    let resized = if scale == Scale::IDENTITY {
        image.to_rgba8()
    } else {
        let w = ((width as f64 * scale.factor()).round() as u32).max(1);
        let h = ((height as f64 * scale.factor()).round() as u32).max(1);
        image.resize_exact(w, h, FilterType::Triangle).to_rgba8()
    };

    egui::ColorImage::from_rgba_unmultiplied(
        [resized.width() as usize, resized.height() as usize],
        resized.as_raw(),
    )
}
