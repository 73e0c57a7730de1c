//! WakeView Playback Demo - terminal HUD over a synthetic seakeeping run
//!
//! Builds a short log in memory (a ship heaving and yawing in waves),
//! plays it with the engine and prints the readouts an overlay would show.
//! Halfway through it scrubs the timeline like a user dragging a slider.
//!
//! Run: `cargo run --example playback_demo`

use wakeview_core::telemetry::wrap_degrees;
use wakeview_core::{
    normalise_force, parse_log_str, ship_speed, HeadingTracker, ParseOptions, PlayerSettings,
    ShipConfig, ShipPlayer, SpeedReadout,
};

// ============================================================================
// ANSI COLOR CODES
// ============================================================================

mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const YELLOW: &str = "\x1b[33m";
}

use colors::*;

// ============================================================================
// SYNTHETIC LOG
// ============================================================================

fn synthetic_log() -> String {
    let mut text = String::from(
        "t,x(ship),y(ship),z(ship),phi(ship),theta(ship),psi(ship),\
         fz(sum of forces ship ship),mx(sum of forces ship ship)\n",
    );

    for i in 0..=200 {
        let t = i as f64 * 0.1;
        let heave = 0.8 * (0.9 * t).sin();
        let roll = 4.0 * (0.6 * t).sin();
        let psi = 0.05 * t;
        let fz = -2.0e7 + 1.5e6 * (0.9 * t).cos();
        let mx = 3.0e6 * (0.6 * t).cos();
        text.push_str(&format!(
            "{:.1},{:.3},0,{:.4},{:.4},0,{:.4},{:.1},{:.1}\n",
            t,
            6.0 * t,
            heave,
            roll,
            psi,
            fz,
            mx
        ));
    }

    text
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    let parsed = match parse_log_str(&synthetic_log(), &ParseOptions::default()) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Failed to parse demo log: {}", e);
            return;
        }
    };

    println!("{BOLD}{CYAN}WakeView playback demo{RESET}");
    println!(
        "{DIM}{} frames, {} channels recognized, {} absent{RESET}\n",
        parsed.report.frames,
        parsed.report.recognized_channels,
        parsed.report.missing_channels.len()
    );

    let settings = PlayerSettings::default().with_looping(false);
    let mut player = ShipPlayer::from_parts(settings, parsed.frames, ShipConfig::default());
    let mut heading = HeadingTracker::new();
    let weight = 2.0e7;

    let dt = 1.0 / 30.0;
    let mut tick = 0u32;

    while player.is_playing() {
        tick += 1;
        player.tick(dt);

        if tick == 300 {
            println!("{YELLOW}  ── scrubbing back to t=5.0s ──{RESET}");
            player.begin_drag();
            player.drag_to(7.5);
            player.end_drag(5.0);
        }

        if tick % 30 != 0 {
            continue;
        }

        let (Some(current), Some(pose)) = (player.current_frame(), player.world_pose()) else {
            break;
        };
        let log_dt = player.previous_frame().map_or(0.0, |p| current.time - p.time);
        let speed = SpeedReadout::from_mps(ship_speed(current, player.previous_frame(), log_dt));

        println!(
            "t={:5.2}s  speed {:5.2} kn  heading {:6.2}°  roll {:+5.2}°  heave {:+5.2} m  Fz/W {:+.3}  euler y {:6.2}°",
            player.elapsed_time(),
            speed.knots,
            heading.update(current.yaw()),
            current.roll(),
            pose.position.y,
            normalise_force(current.total_force.z, weight, 1.0),
            wrap_degrees(pose.euler_degrees().y),
        );
    }

    println!("\n{BOLD}Reached end at {:.2}s{RESET}", player.elapsed_time());
}
