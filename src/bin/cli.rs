use anyhow::{bail, Context, Result};
use snapcam::discovery::DiscoverySession;
use snapcam::testing::SyntheticBackend;
use snapcam::types::{DeviceType, MediaType};
use snapcam::{
    CameraApp, CameraBackend, Facing, FileSystemLibrary, LogPresenter, NativeBackend,
    SnapcamConfig, ViewBounds,
};
use std::env;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const PREVIEW_BOUNDS: ViewBounds = ViewBounds::new(360, 640);
const WARMUP_TIMEOUT: Duration = Duration::from_secs(3);

const USAGE: &str = "Usage: snapcam-cli <command> [args]

Commands:
  list-devices [--json] [--synthetic]
  shoot [--front] [--flash] [--save|--discard] [--synthetic] [--json]
  interactive [--synthetic]

Common options:
  --config <path>   load settings from a TOML file
  --output <dir>    save photos under <dir>";

#[tokio::main]
async fn main() -> Result<()> {
    snapcam::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "list-devices" => cmd_list_devices(&args),
        "shoot" => cmd_shoot(&args).await,
        "interactive" => cmd_interactive(&args).await,
        "-h" | "--help" | "help" => {
            println!("{}", USAGE);
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}\n\n{}", command, USAGE);
            std::process::exit(1);
        }
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn option_value<'a>(args: &'a [String], name: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| a == name) {
        Some(i) => match args.get(i + 1) {
            Some(value) => Ok(Some(value.as_str())),
            None => bail!("{} needs a value", name),
        },
        None => Ok(None),
    }
}

fn load_config(args: &[String]) -> Result<SnapcamConfig> {
    let mut config = match option_value(args, "--config")? {
        Some(path) => SnapcamConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path))?,
        None => SnapcamConfig::load_or_default(),
    };
    if let Some(dir) = option_value(args, "--output")? {
        config.storage.output_directory = dir.to_string();
    }
    Ok(config)
}

fn backend(args: &[String], config: &SnapcamConfig) -> Arc<dyn CameraBackend> {
    if has_flag(args, "--synthetic") {
        Arc::new(SyntheticBackend::new())
    } else {
        Arc::new(NativeBackend::from_config(&config.camera))
    }
}

fn build_app(args: &[String], config: SnapcamConfig) -> CameraApp {
    let backend = backend(args, &config);
    let library = Arc::new(FileSystemLibrary::from_config(&config.storage));
    CameraApp::new(config, backend, library, Arc::new(LogPresenter))
}

/// Open the camera screen and wait for the first preview frame.
fn open_camera(app: &mut CameraApp) -> Result<()> {
    app.open(PREVIEW_BOUNDS).context("camera session did not start")?;
    if app.camera().session().input_count() == 0 {
        bail!("no usable camera at either position");
    }
    if let Some(layer) = app.camera().preview_layer() {
        if layer.wait_for_frame(0, WARMUP_TIMEOUT).is_none() {
            log::warn!("No preview frame within {:?}", WARMUP_TIMEOUT);
        }
    }
    Ok(())
}

fn cmd_list_devices(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let backend = backend(args, &config);
    let discovery = DiscoverySession::new(
        backend.as_ref(),
        &[DeviceType::BuiltInWideAngleCamera, DeviceType::External],
        MediaType::Video,
    )?;

    if has_flag(args, "--json") {
        println!("{}", serde_json::to_string(discovery.devices())?);
    } else {
        for d in discovery.devices() {
            println!("{}: {} [{}, {:?}]", d.id, d.name, d.facing, d.device_type);
        }
    }
    Ok(())
}

async fn cmd_shoot(args: &[String]) -> Result<()> {
    if has_flag(args, "--save") && has_flag(args, "--discard") {
        bail!("--save and --discard are mutually exclusive");
    }

    let mut config = load_config(args)?;
    if has_flag(args, "--front") {
        config.camera.default_facing = Facing::Front;
    }
    if has_flag(args, "--flash") {
        config.camera.flash_enabled = true;
    }

    let mut app = build_app(args, config);
    open_camera(&mut app)?;

    let photo = app.capture().await.context("capture failed")?;
    let saved = if has_flag(args, "--discard") {
        app.cancel()?;
        None
    } else {
        Some(app.save().await.context("save failed")?)
    };
    app.close()?;

    if has_flag(args, "--json") {
        println!(
            "{}",
            serde_json::json!({ "photo": photo, "saved": saved })
        );
    } else {
        println!(
            "Photo {}x{} from {} (flash {})",
            photo.width, photo.height, photo.device_id, photo.flash_mode
        );
        match saved {
            Some(saved) => println!("Saved to {}", saved.location),
            None => println!("Discarded"),
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Capture,
    Flash,
    Turn,
    Save,
    Discard,
    Quit,
}

impl Key {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "c" => Some(Key::Capture),
            "f" => Some(Key::Flash),
            "t" => Some(Key::Turn),
            "s" => Some(Key::Save),
            "x" => Some(Key::Discard),
            "q" => Some(Key::Quit),
            _ => None,
        }
    }
}

async fn cmd_interactive(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let mut app = build_app(args, config);
    open_camera(&mut app)?;

    let (tx, mut rx) = mpsc::unbounded_channel();

    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Key::Quit);
    })
    .context("installing Ctrl-C handler")?;

    std::thread::Builder::new()
        .name("snapcam-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match Key::parse(&line) {
                    Some(key) => {
                        if tx.send(key).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => eprintln!("Unknown key '{}'", line.trim()),
                }
            }
            let _ = tx.send(Key::Quit);
        })
        .context("spawning stdin reader")?;

    println!("c=capture f=flash t=turn camera s=save x=discard q=quit");
    while let Some(key) = rx.recv().await {
        match key {
            Key::Capture => match app.capture().await {
                Ok(photo) => println!(
                    "Captured {}x{} (flash {}); s to save, x to discard",
                    photo.width, photo.height, photo.flash_mode
                ),
                Err(e) => eprintln!("{}", e),
            },
            Key::Flash => {
                let on = app.camera_mut().toggle_flash();
                println!("Flash {}", if on { "on" } else { "off" });
            }
            Key::Turn => match app.camera_mut().toggle_facing() {
                Ok(device) => println!("Using {} ({})", device.name, device.facing),
                Err(e) => eprintln!("{}", e),
            },
            Key::Save => match app.save().await {
                Ok(saved) => println!("Saved to {}", saved.location),
                Err(e) => eprintln!("{}", e),
            },
            Key::Discard => match app.cancel() {
                Ok(()) => println!("Discarded"),
                Err(e) => eprintln!("{}", e),
            },
            Key::Quit => break,
        }
    }

    app.close()?;
    println!("Camera closed");
    Ok(())
}
