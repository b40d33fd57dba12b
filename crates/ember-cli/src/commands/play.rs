//! Play command - opens the demo window

use anyhow::Result;
use ember_core::Demo;
use ember_player::PlayOptions;

pub fn run(options: PlayOptions) -> Result<()> {
    let config = options.resolve()?;

    match config.demo {
        Demo::Particles => println!(
            "Playing {} particles (seed {})",
            config.simulation.particle_count, config.simulation.seed
        ),
        Demo::Triangle => println!("Playing the triangle demo"),
    }
    println!();
    println!("Controls:");
    println!("  Escape / Backspace - Exit");

    ember_player::run(config)
}
