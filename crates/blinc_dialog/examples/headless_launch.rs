//! Headless Dialog Launch
//!
//! Drives a launch and an exit animation on an in-memory surface tree and
//! logs the bounds of the morphing surfaces.
//!
//! Run with:
//!   RUST_LOG=blinc_dialog=debug cargo run -p blinc_dialog --example headless_launch
//!
//! Pass a TOML file to override the animation config:
//!   cargo run -p blinc_dialog --example headless_launch -- dialog.toml

use std::rc::Rc;

use anyhow::Context;
use blinc_core::{Background, Color, Gravity, LayoutParams, Size, SurfaceTree};
use blinc_dialog::{
    Dialog, DialogLaunchAnimator, DialogLaunchConfig, FullscreenHostProvider, SurfaceDialog,
    WindowAttributes,
};
use tracing_subscriber::EnvFilter;

const FRAME_MS: f32 = 16.0;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path))?;
            DialogLaunchConfig::from_toml_str(&source)?
        }
        None => DialogLaunchConfig::default(),
    };
    let frames = (config.timing.total_duration_ms as f32 / FRAME_MS).ceil() as usize + 4;

    let mut tree = SurfaceTree::new(Size::new(400.0, 800.0));
    let app = tree.create_window("app", tree.screen());
    tree.attach_window(app);
    let button = tree.create("button");
    tree.set_layout_params(
        button,
        LayoutParams::fixed(120.0, 48.0).with_gravity(Gravity::Bottom),
    );
    tree.set_background(button, Some(Background::new(Color::from_hex(0x6750A4), 24.0)));
    tree.add_child(app, button);
    tree.frame(FRAME_MS);

    let body = tree.create("body");
    tree.set_content_size(body, Size::new(280.0, 360.0));
    let dialog = SurfaceDialog::new(
        &mut tree,
        "confirm",
        body,
        WindowAttributes::fixed(280.0, 360.0)
            .with_background(Background::new(Color::from_hex(0xECE6F0), 28.0)),
    );

    let animator =
        DialogLaunchAnimator::with_config(config, Rc::new(FullscreenHostProvider::new()));
    animator.on_transition_finished(|id, path| {
        tracing::info!("transition {:?} finished: {:?}", id, path);
    });

    let launch = animator.show_from_surface(&mut tree, dialog.clone(), button, true)?;
    let id = launch.id().context("button was already launching a dialog")?;

    for frame in 0..frames {
        tree.frame(FRAME_MS);
        if let Some(content) = animator.content_with_background(id) {
            let ghost = tree.ghost(content).unwrap_or(content);
            tracing::info!("frame {:>2}: {:?}", frame, tree.bounds(ghost));
        }
    }

    dialog.dismiss(&mut tree);
    for _ in 0..frames {
        tree.frame(FRAME_MS);
    }

    tracing::info!(
        "done: {} live transitions, button {:?}",
        animator.transition_count(),
        tree.visibility(button)
    );
    Ok(())
}
