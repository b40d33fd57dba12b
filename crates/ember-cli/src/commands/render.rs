//! Headless demo-to-PNG render command

use super::offline_pacing;
use anyhow::{Context, Result};
use ember_player::PlayOptions;
use ember_render::{demo_view, HeadlessContext, WgpuBackend};
use ember_runtime::FrameDriver;

pub struct RenderArgs {
    pub options: PlayOptions,
    pub output: String,
    pub frames: u32,
    pub width: u32,
    pub height: u32,
}

pub fn run(args: RenderArgs) -> Result<()> {
    let config = args.options.resolve()?;

    let ctx = pollster::block_on(HeadlessContext::new(args.width, args.height))
        .context("Failed to create headless render context")?;
    let mut backend = ctx.create_backend();

    let mut view = demo_view::<WgpuBackend>(&config);
    let mut driver = FrameDriver::new(offline_pacing(&config));
    driver
        .start(view.as_mut(), &mut backend)
        .with_context(|| format!("The {} demo failed to initialize", config.demo.name()))?;
    driver.resize(view.as_mut(), &mut backend, ctx.width, ctx.height);

    let frames = args.frames.max(1);
    for _ in 0..frames {
        backend.begin_frame(ctx.frame_target());
        driver.tick(view.as_mut(), &mut backend);
        backend.end_frame();
    }

    // Read back pixels
    let pixels = pollster::block_on(ctx.read_pixels()).context("Failed to read rendered pixels")?;
    driver.shutdown(view.as_mut(), &mut backend);

    // Encode as PNG
    let img = image::RgbaImage::from_raw(ctx.width, ctx.height, pixels)
        .context("Failed to create image from pixel data")?;
    img.save(&args.output)
        .with_context(|| format!("Failed to save image to {}", args.output))?;

    println!(
        "Rendered frame {} at {}x{} to {}",
        frames, ctx.width, ctx.height, args.output
    );

    Ok(())
}
