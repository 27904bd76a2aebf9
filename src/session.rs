//! Scripted headless session: one panel driven by a fixed-step host loop.

use crate::config::DemoConfig;
use anyhow::{Context, Result};
use glam::Vec3;
use serde_json::json;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, info, warn};
use webplane_core::{Bitmap, Millis};
use webplane_dom::MemoryDocument;
use webplane_scene::{Camera, Scene, SceneGraph};
use webplane_testkit::{EventRecord, JsonlSink, SolidRasterizer};
use webplane_ui3d::{
    ClickContext, ClickResult, JobId, MethodTable, PanelEnv, PanelManager, PipelineStatus,
    PointerDispatcher, SurfacePanel,
};

/// What a session did.
#[derive(Debug)]
pub struct SessionReport {
    /// Methods invoked by clicks, in order.
    pub invoked: Vec<String>,
    /// Click results, in order.
    pub clicks: Vec<ClickResult>,
    /// Frames presented.
    pub frames: usize,
    /// Errors reported by the panel.
    pub errors: Vec<String>,
    pub last_frame: Option<Bitmap>,
    pub status: PipelineStatus,
}

/// Pop every event due at or before `now`.
fn due<'a, T>(queue: &mut VecDeque<&'a T>, now: Millis, at: impl Fn(&T) -> u64) -> Vec<&'a T> {
    let mut out = Vec::new();
    while queue.front().is_some_and(|e| at(*e) <= now.0) {
        if let Some(event) = queue.pop_front() {
            out.push(event);
        }
    }
    out
}

fn sorted<T>(events: &[T], at: impl Fn(&T) -> u64) -> VecDeque<&T> {
    let mut refs: Vec<&T> = events.iter().collect();
    refs.sort_by_key(|e| at(*e));
    refs.into()
}

fn record(sink: &mut Option<&mut JsonlSink>, at: Millis, kind: &str, payload: &str) -> Result<()> {
    if let Some(sink) = sink.as_deref_mut() {
        sink.write(&EventRecord { at, kind, payload })?;
    }
    Ok(())
}

/// Run `config` to completion, logging host-visible events to `events`.
pub fn run(config: &DemoConfig, mut events: Option<&mut JsonlSink>) -> Result<SessionReport> {
    let mut document = MemoryDocument::new();
    let mut scene = Scene::new();
    let mut rasterizer = SolidRasterizer::new(config.fill);
    let mut panels = PanelManager::new();
    let mut dispatcher = PointerDispatcher::new();
    dispatcher.attach(&mut scene);

    let invoked = Rc::new(RefCell::new(Vec::new()));
    let errors = Rc::new(RefCell::new(Vec::new()));

    let mut methods = MethodTable::new();
    for name in &config.methods {
        let sink = Rc::clone(&invoked);
        let label = name.clone();
        methods = methods.with(name.clone(), move |ctx: &ClickContext| {
            info!(method = %label, x = ctx.pixel.x, y = ctx.pixel.y, "method invoked");
            sink.borrow_mut().push(label.clone());
        });
    }

    let panel = {
        let mut env = PanelEnv::new(&mut document, &mut scene, &mut rasterizer);
        let error_sink = Rc::clone(&errors);
        SurfacePanel::with_error_handler(
            &mut env,
            Millis::ZERO,
            config.markup(),
            methods,
            config.panel.clone(),
            move |err| error_sink.borrow_mut().push(err.to_string()),
        )
        .context("initial panel content was rejected")?
    };
    let panel = panels.add(&mut scene, panel);
    scene.set_position(panel, Vec3::from_array(config.panel_position));
    let camera_position = Vec3::from_array(config.camera_position);

    let mut images = sorted(&config.images, |e| e.at_ms);
    let mut clicks = sorted(&config.clicks, |e| e.at_ms);
    let mut resubmits = sorted(&config.resubmit, |e| e.at_ms);

    let step = config.tick_ms.max(1);
    let mut now = Millis::ZERO;
    let mut shown: Option<JobId> = None;
    let mut frames = 0;
    let mut click_results = Vec::new();
    let mut reported = 0;

    loop {
        for image in due(&mut images, now, |e| e.at_ms) {
            let settled = document.resolve_source(&image.src, image.ok);
            let mut env = PanelEnv::new(&mut document, &mut scene, &mut rasterizer);
            for node in settled {
                panels.on_image_settled(&mut env, node);
            }
        }

        for resubmit in due(&mut resubmits, now, |e| e.at_ms) {
            let mut env = PanelEnv::new(&mut document, &mut scene, &mut rasterizer);
            if let Some(target) = panels.get_mut(panel) {
                if let Err(err) = target.submit_content(&mut env, now, resubmit.content.as_str()) {
                    debug!(%err, "scripted resubmission rejected");
                }
            }
        }

        let observers = document.take_mutations();
        {
            let mut env = PanelEnv::new(&mut document, &mut scene, &mut rasterizer);
            panels.deliver_mutations(&mut env, now, &observers);
            panels.tick(&mut env, now);
        }

        // A completion can start the next job, which may finish immediately.
        loop {
            let ready = rasterizer.take_ready();
            if ready.is_empty() {
                break;
            }
            let mut env = PanelEnv::new(&mut document, &mut scene, &mut rasterizer);
            for (request, bitmap) in ready {
                panels.on_bitmap_ready(&mut env, request.panel, request.job, Ok(bitmap));
            }
        }

        if let Some(frame) = panels.get(panel).and_then(SurfacePanel::frame) {
            if shown != Some(frame.job) {
                shown = Some(frame.job);
                frames += 1;
                let payload = json!({
                    "job": frame.job.0,
                    "width": frame.geometry.pixels.width,
                    "height": frame.geometry.pixels.height,
                    "buttons": frame.bounds.iter().map(|b| b.method.as_str()).collect::<Vec<_>>(),
                });
                record(&mut events, now, "frame", &payload.to_string())?;
            }
        }

        for click in due(&mut clicks, now, |e| e.at_ms) {
            scene.set_camera(&Camera::looking_at(camera_position, Vec3::from_array(click.target)));
            dispatcher.pointer_down();
            if let Some(result) = dispatcher.pointer_up(&mut scene, &mut panels) {
                record(&mut events, now, "click", &format!("{result:?}"))?;
                click_results.push(result);
            }
        }

        let new_errors: Vec<String> = errors.borrow()[reported..].to_vec();
        for err in &new_errors {
            warn!(at = now.0, %err, "panel reported an error");
            record(&mut events, now, "error", err)?;
        }
        reported += new_errors.len();

        if now.0 >= config.duration_ms {
            break;
        }
        now = now.advance(step);
    }

    let target = panels.get(panel).context("demo panel disappeared")?;
    let report = SessionReport {
        invoked: invoked.borrow().clone(),
        clicks: click_results,
        frames,
        errors: errors.borrow().clone(),
        last_frame: target.frame().map(|f| f.bitmap.clone()),
        status: target.status(),
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClickEvent, ImageEvent, ResubmitEvent};
    use webplane_ui3d::{DispatchOutcome, PipelineState};

    #[test]
    fn default_session_clicks_save() {
        let report = run(&DemoConfig::default(), None).unwrap();
        assert_eq!(report.frames, 1);
        assert_eq!(report.invoked, vec!["save"]);
        assert!(report.errors.is_empty());
        assert_eq!(report.status.state, PipelineState::Idle);
        assert_eq!(report.last_frame.unwrap().size().width, 320);
    }

    #[test]
    fn images_hold_the_first_frame() {
        let config = DemoConfig {
            content: r#"<img src="logo.png" width="64" height="64"><a method="save" width="64" height="32">s</a>"#.into(),
            images: vec![ImageEvent {
                at_ms: 200,
                src: "logo.png".into(),
                ok: true,
            }],
            clicks: vec![
                ClickEvent {
                    at_ms: 100,
                    target: [0.0, -0.08, -1.0],
                },
                ClickEvent {
                    at_ms: 250,
                    target: [0.0, -0.08, -1.0],
                },
            ],
            duration_ms: 300,
            ..DemoConfig::default()
        };
        let report = run(&config, None).unwrap();
        // No plane exists before the first frame, so only the reticle is hit.
        assert_eq!(report.clicks[0], ClickResult::NoHit);
        assert!(matches!(
            &report.clicks[1],
            ClickResult::Panel { outcome: DispatchOutcome::Invoked { method, .. }, .. } if method == "save"
        ));
        assert_eq!(report.frames, 1);
        assert_eq!(report.last_frame.unwrap().size().height, 96);
    }

    #[test]
    fn failed_first_render_is_reported() {
        let config = DemoConfig {
            content: r#"<div width="0" height="0"></div>"#.into(),
            clicks: Vec::new(),
            duration_ms: 32,
            ..DemoConfig::default()
        };
        let report = run(&config, None).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("nothing to paint"));
        assert_eq!(report.frames, 0);
        assert_eq!(report.status.state, PipelineState::Idle);
    }

    #[test]
    fn rejected_resubmission_is_reported() {
        let config = DemoConfig {
            resubmit: vec![ResubmitEvent {
                at_ms: 50,
                content: "   ".into(),
            }],
            clicks: Vec::new(),
            duration_ms: 100,
            ..DemoConfig::default()
        };
        let report = run(&config, None).unwrap();
        assert_eq!(report.errors, vec!["content is empty".to_string()]);
        assert_eq!(report.frames, 1);
    }
}
