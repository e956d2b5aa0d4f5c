use directories::UserDirs;
use log::{info, warn};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot locate the home directory")]
    NoHome,
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration in {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
    #[error("profile not found: {}", .0.display())]
    UnknownProfile(PathBuf),
}

// ---------------- host configuration (config.json) ----------------

/// Where frames come from: the drone's own camera or a local device index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCamera", into = "RawCamera")]
pub enum CameraSource {
    Drone,
    Device(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCamera {
    Index(u32),
    Name(String),
}

impl TryFrom<RawCamera> for CameraSource {
    type Error = String;

    fn try_from(raw: RawCamera) -> Result<Self, String> {
        match raw {
            RawCamera::Index(i) => Ok(Self::Device(i)),
            RawCamera::Name(s) if s == "drone" => Ok(Self::Drone),
            RawCamera::Name(s) => Err(format!(
                "camera must be \"drone\" or a device index, got \"{s}\""
            )),
        }
    }
}

impl From<CameraSource> for RawCamera {
    fn from(c: CameraSource) -> Self {
        match c {
            CameraSource::Drone => RawCamera::Name("drone".into()),
            CameraSource::Device(i) => RawCamera::Index(i),
        }
    }
}

impl std::str::FromStr for CameraSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.parse::<u32>() {
            Ok(i) => Ok(Self::Device(i)),
            Err(_) => Self::try_from(RawCamera::Name(s.to_string())),
        }
    }
}

impl std::fmt::Display for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drone => f.write_str("drone"),
            Self::Device(i) => write!(f, "device {i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    pub camera: CameraSource,
    pub connect_drone: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            camera: CameraSource::Device(0),
            connect_drone: false,
        }
    }
}

impl HostConfig {
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

// ---------------- tuning profile (profiles/<name>.toml) ----------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Thresholds {
    /// Thumb tip must sit this many pixels below the index knuckle for Stop.
    pub stop_thumb_margin_px: i32,
    pub min_move_cm: u32,
    pub min_rotate_deg: u32,
    pub max_missed_frames: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stop_thumb_margin_px: 50,
            min_move_cm: 40,
            min_rotate_deg: 1,
            max_missed_frames: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MinimapSettings {
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    pub canvas_size: u32,
    pub position: [u32; 2],
    pub size: u32,
}

fn enabled_default() -> bool {
    true
}

impl Default for MinimapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            canvas_size: 5000,
            position: [10, 10],
            size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VideoSettings {
    pub mirror: bool,
    pub show_landmarks: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            mirror: true,
            show_landmarks: true,
            width: 960,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub meta: Meta,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub minimap: MinimapSettings,
    #[serde(default)]
    pub video: VideoSettings,
}

impl Profile {
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        };
        let profile: Profile = toml::from_str(text).map_err(|e| invalid(e.to_string()))?;
        validate_profile(&profile).map_err(invalid)?;
        Ok(profile)
    }
}

/// Largest world canvas side, in pixels.
pub const MAX_CANVAS_SIZE: u32 = 20_000;

fn validate_profile(p: &Profile) -> Result<(), String> {
    let th = &p.thresholds;
    if th.stop_thumb_margin_px < 0 {
        return Err("thresholds.stop_thumb_margin_px must not be negative".into());
    }
    if th.max_missed_frames == 0 {
        return Err("thresholds.max_missed_frames must be positive".into());
    }
    if p.video.width == 0 || p.video.height == 0 {
        return Err("video.width and video.height must be positive".into());
    }
    let m = &p.minimap;
    if m.size == 0 {
        return Err("minimap.size must be positive".into());
    }
    if m.canvas_size > MAX_CANVAS_SIZE {
        return Err(format!(
            "minimap.canvas_size {} exceeds {MAX_CANVAS_SIZE}",
            m.canvas_size
        ));
    }
    // The viewport is as large as the frame; the canvas must hold it with room to travel.
    let (width, height) = (u64::from(p.video.width), u64::from(p.video.height));
    if u64::from(m.canvas_size) < width.max(height) * 2 {
        return Err(format!(
            "minimap.canvas_size {} is too small for {}x{} frames",
            m.canvas_size, p.video.width, p.video.height
        ));
    }
    let [x, y] = m.position;
    let span = 2 * u64::from(m.size);
    if u64::from(x) + span > width || u64::from(y) + span > height {
        return Err(format!(
            "minimap at ({x}, {y}) with size {} does not fit a {}x{} frame",
            m.size, p.video.width, p.video.height
        ));
    }
    Ok(())
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

// ---------------- on-disk state ----------------

#[derive(Debug, Clone)]
pub struct ConfigState {
    pub host: HostConfig,
    pub active_name: String,
    pub profile: Profile,
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let dirs = UserDirs::new().ok_or(ConfigError::NoHome)?;
    Ok(dirs.home_dir().join(".config").join("handpilot"))
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

impl ConfigState {
    /// Loads `config.json` and the active profile from `dir`, installing
    /// defaults for whatever is missing.
    pub fn load_or_install_default(dir: &Path) -> Result<Self, ConfigError> {
        let profiles_dir = dir.join("profiles");
        fs::create_dir_all(&profiles_dir).map_err(|source| ConfigError::Write {
            path: profiles_dir.clone(),
            source,
        })?;

        let host_path = dir.join("config.json");
        if !host_path.exists() {
            let text = serde_json::to_string_pretty(&HostConfig::default()).map_err(|e| {
                ConfigError::Invalid {
                    path: host_path.clone(),
                    reason: e.to_string(),
                }
            })?;
            write(&host_path, text.as_bytes())?;
            info!("installed default config at {}", host_path.display());
        }
        let host = HostConfig::parse(&host_path, &read(&host_path)?)?;

        let def_path = profiles_dir.join("default.toml");
        if !def_path.exists() {
            write(&def_path, default_profile_text().as_bytes())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = dir.join("active");
        if !active_ptr.exists() {
            write(&active_ptr, b"default")?;
        }
        let active_name = read(&active_ptr)?.trim().to_string();
        let profile = load_profile(&profiles_dir, &active_name)?;

        Ok(Self {
            host,
            active_name,
            profile,
            config_dir: dir.to_path_buf(),
            profiles_dir,
            active_ptr,
        })
    }

    /// Re-reads the active profile; on error the previous one stays in place.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        self.profile = load_profile(&self.profiles_dir, &self.active_name)?;
        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), ConfigError> {
        let p = self.profiles_dir.join(format!("{name}.toml"));
        if !p.exists() {
            return Err(ConfigError::UnknownProfile(p));
        }
        let profile = load_profile(&self.profiles_dir, name)?;
        write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.profile = profile;
        Ok(())
    }

    pub fn set_camera(&mut self, camera: CameraSource) -> Result<(), ConfigError> {
        let path = self.host_path();
        let mut host = self.host.clone();
        host.camera = camera;
        let text = serde_json::to_string_pretty(&host).map_err(|e| ConfigError::Invalid {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        write(&path, text.as_bytes())?;
        self.host = host;
        Ok(())
    }

    pub fn host_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }

    pub fn report(&self) -> serde_json::Value {
        serde_json::json!({
            "config_dir": self.config_dir,
            "host": self.host,
            "active_profile": self.active_name,
            "profile": self.profile,
        })
    }
}

fn load_profile(profiles_dir: &Path, name: &str) -> Result<Profile, ConfigError> {
    let path = profiles_dir.join(format!("{name}.toml"));
    Profile::parse(&path, &read(&path)?)
}

// ---------------- hot reload ----------------

/// Watches the profiles directory and reloads the active profile when a
/// file in it changes.
pub struct ProfileWatcher {
    state: ConfigState,
    rx: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl ProfileWatcher {
    pub fn new(state: ConfigState) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(&state.profiles_dir, RecursiveMode::NonRecursive)?;
        info!("watching {} for profile edits", state.profiles_dir.display());
        Ok(Self {
            state,
            rx,
            _watcher: watcher,
        })
    }

    fn changed(&self) -> bool {
        let mut any = false;
        while let Ok(ev) = self.rx.try_recv() {
            match ev {
                Ok(e) if e.kind.is_modify() || e.kind.is_create() => any = true,
                Ok(_) => {}
                Err(e) => warn!("profile watcher: {e}"),
            }
        }
        any
    }

    /// The freshly loaded profile if anything changed since the last poll.
    /// A broken edit is logged and the last good profile stays active.
    pub fn poll(&mut self) -> Option<&Profile> {
        if !self.changed() {
            return None;
        }
        match self.state.reload() {
            Ok(()) => {
                info!("profile '{}' reloaded", self.state.active_name);
                Some(&self.state.profile)
            }
            Err(e) => {
                warn!("reload failed, keeping last good profile: {e}");
                None
            }
        }
    }
}
