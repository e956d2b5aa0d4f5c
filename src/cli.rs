use anyhow::{Context, Result, anyhow, bail};
use log::{info, warn};
use pico_args::Arguments;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::{
    env,
    path::PathBuf,
    sync::{Arc, atomic::AtomicBool},
};

use crate::actions::{SimulatedVehicle, VehicleActuator};
use crate::config::{self, CameraSource, ConfigState, ProfileWatcher};
use crate::flight::DispatchCommand;
use crate::input::{BlankSource, FrameSource, ImageDirSource};
use crate::session::{self, FrameSink, NullSink, PngSequenceSink, Pilot, SessionEnd};
use crate::tracker::ScriptedDetector;

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let config_dir: Option<PathBuf> = pargs.opt_value_from_str("--config-dir")?;
    let config_dir = match config_dir {
        Some(d) => d,
        None => config::default_config_dir()?,
    };

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("run") => run_command(&mut pargs, &config_dir),

        Some("camera") => {
            let cam: CameraSource = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: handpilot camera <drone|INDEX>"))?;
            let mut cfg = load(&config_dir)?;
            cfg.set_camera(cam)
                .with_context(|| format!("updating {}", cfg.host_path().display()))?;
            println!("ok: camera set to {cam}");
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: handpilot use <profile_name>"))?;
            let mut cfg = load(&config_dir)?;
            cfg.set_active(&name)?;
            println!("ok: active profile is now {}", cfg.active_name);
            Ok(())
        }

        Some("list") => {
            let cfg = load(&config_dir)?;
            for name in cfg.list_profiles() {
                let mark = if name == cfg.active_name { '*' } else { ' ' };
                println!("{mark} {name}");
            }
            Ok(())
        }

        Some("config") => {
            let cfg = load(&config_dir)?;
            print_response(&cfg.report());
            Ok(())
        }

        Some("emit") => {
            let words: Vec<String> = pargs
                .finish()
                .into_iter()
                .map(|s| s.to_string_lossy().into_owned())
                .collect();
            if words.is_empty() {
                bail!("usage: handpilot emit <step> [step ...]");
            }
            emit(&words)
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn load(dir: &std::path::Path) -> Result<ConfigState> {
    ConfigState::load_or_install_default(dir)
        .with_context(|| format!("loading configuration from {}", dir.display()))
}

fn run_command(pargs: &mut Arguments, config_dir: &std::path::Path) -> Result<()> {
    let frames_dir: Option<PathBuf> = pargs.opt_value_from_str("--frames")?;
    let landmarks: Option<PathBuf> = pargs.opt_value_from_str("--landmarks")?;
    let out_dir: Option<PathBuf> = pargs.opt_value_from_str("--out")?;
    let count: Option<u64> = pargs.opt_value_from_str("--count")?;

    let cfg = load(config_dir)?;
    let profile = cfg.profile.clone();
    info!(
        "profile '{}' from {}",
        cfg.active_name,
        cfg.profiles_dir.display()
    );
    match cfg.host.camera {
        CameraSource::Drone => info!("camera: drone video feed"),
        CameraSource::Device(i) => info!("camera: local device {i}"),
    }

    let detector = match &landmarks {
        Some(p) => ScriptedDetector::open(p)?,
        None => {
            warn!("no --landmarks script; no hand will be detected");
            ScriptedDetector::idle()
        }
    };

    let vehicle = if cfg.host.connect_drone {
        let mut v = SimulatedVehicle::new();
        info!("vehicle connected, battery {}%", v.battery_percent()?);
        Some(v)
    } else {
        info!("no vehicle; gestures are tracked but nothing flies");
        None
    };

    let mut source: Box<dyn FrameSource> = match &frames_dir {
        Some(dir) => Box::new(
            ImageDirSource::open(dir, profile.video.width, profile.video.height)
                .with_context(|| format!("opening frames in {}", dir.display()))?,
        ),
        None => Box::new(BlankSource::new(
            profile.video.width,
            profile.video.height,
            count,
        )),
    };
    let mut sink: Box<dyn FrameSink> = match out_dir {
        Some(dir) => Box::new(PngSequenceSink::create(dir, count)?),
        None => Box::new(NullSink),
    };

    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&stop)).context("registering SIGINT")?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&stop)).context("registering SIGTERM")?;

    let mut watcher = match ProfileWatcher::new(cfg) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("profile hot reload disabled: {e}");
            None
        }
    };

    let mut pilot = Pilot::new(detector, vehicle, profile);
    let end = session::run_session(
        source.as_mut(),
        &mut pilot,
        sink.as_mut(),
        &stop,
        watcher.as_mut(),
    )?;

    match end {
        SessionEnd::ConnectionLost { misses } => {
            warn!("session ended: connection lost after {misses} missed frames")
        }
        SessionEnd::Interrupted => info!("session ended: interrupted"),
        SessionEnd::SinkClosed => info!("session ended: output closed"),
    }
    let (x, y) = pilot.minimap().position();
    info!(
        "final state {:?}, {} path entries unflown, map position ({x}, {y}) heading {:.0} deg",
        pilot.flight_state(),
        pilot.queue().len(),
        pilot.minimap().heading_deg()
    );
    info!("last {}", pilot.feedback());
    if let Some(airborne) = pilot.dispatch(DispatchCommand::IsFlying)? {
        info!("vehicle airborne: {airborne}");
    }
    if let Some(v) = pilot.vehicle() {
        info!("vehicle flew {} maneuvers", v.history().len());
    }
    Ok(())
}

/// Runs a sequence of manual steps against a fresh simulated vehicle, e.g.
/// `takeoff forward 50 ccw 90 land`.
fn emit(words: &[String]) -> Result<()> {
    let mut v = SimulatedVehicle::new();
    let mut it = words.iter();
    while let Some(step) = it.next() {
        let mut amount = |what: &str| -> Result<u32> {
            let raw = it
                .next()
                .ok_or_else(|| anyhow!("usage: handpilot emit {what} <amount>"))?;
            raw.parse()
                .with_context(|| format!("bad amount for {what}: {raw}"))
        };
        match step.as_str() {
            "takeoff" => v.takeoff()?,
            "land" => v.land()?,
            "forward" => v.move_forward(amount("forward")?)?,
            "back" => v.move_backward(amount("back")?)?,
            "left" => v.move_left(amount("left")?)?,
            "right" => v.move_right(amount("right")?)?,
            "up" => v.move_up(amount("up")?)?,
            "down" => v.move_down(amount("down")?)?,
            "cw" => v.rotate_right(amount("cw")?)?,
            "ccw" => v.rotate_left(amount("ccw")?)?,
            "battery" => println!("battery: {}%", v.battery_percent()?),
            "height" => println!("height: {} cm", v.altitude_cm()?),
            other => bail!("unknown emit step: {other}"),
        }
        println!("ok: {step}");
    }
    let (x, y) = v.position_cm;
    let heading_deg = v.heading_deg;
    println!(
        "pose: ({x:.1}, {y:.1}) cm, heading {:.0} deg, altitude {} cm",
        heading_deg,
        v.altitude_cm()?
    );
    Ok(())
}

fn print_help() {
    println!(
        r#"handpilot - steer a drone with hand gestures

USAGE:
  handpilot [--config-dir DIR] <command>

COMMANDS:
  help [command]                  Show general or command-specific help
  run [options]                   Run a control session
  camera <drone|INDEX>            Choose the video source
  use <name>                      Switch active profile
  list                            List profiles
  config                          Print resolved configuration as JSON
  emit <step> [step ...]          Fly manual steps on a simulated vehicle

GESTURES (right hand, fingers up):
  fist                            take off / fly the queued path
  open palm, thumb down           land
  open palm                       wait
  index finger                    queue a move (sideways motion sets length)
  index + middle                  queue a rotation

TIPS:
  - Profiles: ~/.config/handpilot/profiles (edits reload live)
  - Active profile pointer: ~/.config/handpilot/active
  - Log level: RUST_LOG or HANDPILOT_LOG
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: handpilot run [--frames DIR] [--landmarks FILE] [--out DIR] [--count N]\n\
             Runs the control loop. Frames come from DIR (sorted by name) or a blank feed;\n\
             hands come from a JSON-lines landmark script. Annotated frames are written\n\
             to --out as PNG. Ctrl-C ends the session."
        ),
        "camera" => println!(
            "usage: handpilot camera <drone|INDEX>\nWrites the camera choice to config.json."
        ),
        "use" => {
            println!("usage: handpilot use <name>\nSwitches active profile to <name>.")
        }
        "list" => {
            println!("usage: handpilot list\nLists available profiles; marks active with '*'.")
        }
        "config" => println!(
            "usage: handpilot config\nPrints host config and the active profile."
        ),
        "emit" => println!(
            "usage: handpilot emit <step> [step ...]\n\
             steps: takeoff, land, forward N, back N, left N, right N, up N, down N,\n\
             cw D, ccw D, battery, height"
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
