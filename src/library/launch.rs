//! Title launching
//!
//! [`LoadKind::detect`] decides how a path is handed to the emulation core.
//! The core itself sits behind [`EmulationCore`]; [`CommandCore`] runs an
//! external core executable and reports the session back to the UI.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::dispatch::{ShellMessage, UiDispatcher};
use crate::hid::{ControllerType, PlayerIndex};

const SESSION_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Please specify a valid XCI/NCA/NSP/PFS0/NRO file, {0} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No emulation core configured")]
    NoCoreConfigured,

    #[error("A title is already running")]
    AlreadyRunning,

    #[error("No title is running")]
    NotRunning,

    #[error("Failed to stop the core: {0}")]
    Stop(#[source] io::Error),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadKind {
    CartWithRomFs { romfs: PathBuf },
    Cart,
    Xci,
    Nca,
    Nsp,
    Homebrew,
}

impl LoadKind {
    pub fn detect(path: &Path) -> Result<Self, LaunchError> {
        if path.is_dir() {
            let romfs = match first_with_extension(path, "istorage")? {
                Some(found) => Some(found),
                None => first_with_extension(path, "romfs")?,
            };
            return Ok(match romfs {
                Some(romfs) => LoadKind::CartWithRomFs { romfs },
                None => LoadKind::Cart,
            });
        }

        if !path.is_file() {
            return Err(LaunchError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        Ok(match extension.as_str() {
            "xci" => LoadKind::Xci,
            "nca" => LoadKind::Nca,
            "nsp" | "pfs0" => LoadKind::Nsp,
            _ => LoadKind::Homebrew,
        })
    }

    /// Value passed to the core's `--load` option
    pub fn arg(&self) -> &'static str {
        match self {
            LoadKind::CartWithRomFs { .. } | LoadKind::Cart => "cart",
            LoadKind::Xci => "xci",
            LoadKind::Nca => "nca",
            LoadKind::Nsp => "nsp",
            LoadKind::Homebrew => "homebrew",
        }
    }
}

impl fmt::Display for LoadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadKind::CartWithRomFs { .. } => write!(f, "cart with RomFS"),
            LoadKind::Cart => write!(f, "cart without RomFS"),
            LoadKind::Xci => write!(f, "XCI"),
            LoadKind::Nca => write!(f, "NCA"),
            LoadKind::Nsp => write!(f, "NSP"),
            LoadKind::Homebrew => write!(f, "homebrew"),
        }
    }
}

fn first_with_extension(dir: &Path, extension: &str) -> Result<Option<PathBuf>, LaunchError> {
    let read = fs::read_dir(dir).map_err(|source| LaunchError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut matches: Vec<PathBuf> = read
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    matches.sort();
    Ok(matches.into_iter().next())
}

/// Everything the core needs to start a title
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRequest {
    pub path: PathBuf,
    pub kind: LoadKind,
    pub controllers: Vec<(PlayerIndex, ControllerType)>,
}

impl LaunchRequest {
    pub fn new(
        path: PathBuf,
        controllers: Vec<(PlayerIndex, ControllerType)>,
    ) -> Result<Self, LaunchError> {
        let kind = LoadKind::detect(&path)?;
        info!("Loading {} as {}", path.display(), kind);
        Ok(Self {
            path,
            kind,
            controllers,
        })
    }
}

pub trait EmulationCore: Send + Sync {
    /// Starts the title. The session end is reported as
    /// [`ShellMessage::TitleExited`] or [`ShellMessage::TitleFailed`].
    fn launch(&self, request: LaunchRequest, dispatcher: UiDispatcher) -> Result<(), LaunchError>;

    /// Ends the running title. The end of the session is still reported
    /// through the dispatcher of [`EmulationCore::launch`].
    fn stop(&self) -> Result<(), LaunchError>;
}

/// Runs an external core binary, one process per session.
#[derive(Debug, Clone)]
pub struct CommandCore {
    program: PathBuf,
    extra_args: Vec<String>,
    /// Process of the running session, taken out once it has been reaped
    session: Arc<Mutex<Option<Child>>>,
}

impl CommandCore {
    pub fn new(program: PathBuf, extra_args: Vec<String>) -> Self {
        Self {
            program,
            extra_args,
            session: Arc::default(),
        }
    }

    pub fn command(&self, request: &LaunchRequest) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.extra_args);
        command.arg("--load").arg(request.kind.arg());
        if let LoadKind::CartWithRomFs { romfs } = &request.kind {
            command.arg("--romfs").arg(romfs);
        }
        for (player, controller_type) in &request.controllers {
            command
                .arg("--controller")
                .arg(format!("{}={:?}", player, controller_type));
        }
        command.arg(&request.path);
        command
    }
}

fn lock_session(session: &Mutex<Option<Child>>) -> MutexGuard<'_, Option<Child>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Polls the session process until it exits, then clears the slot.
fn watch_session(session: &Mutex<Option<Child>>) -> io::Result<ExitStatus> {
    loop {
        {
            let mut slot = lock_session(session);
            let child = slot
                .as_mut()
                .ok_or_else(|| io::Error::other("core process handle lost"))?;
            match child.try_wait() {
                Ok(Some(status)) => {
                    slot.take();
                    return Ok(status);
                }
                Ok(None) => {}
                Err(e) => {
                    slot.take();
                    return Err(e);
                }
            }
        }
        thread::sleep(SESSION_POLL);
    }
}

/// Kills and reaps a session nobody is watching.
fn abandon_session(session: &Mutex<Option<Child>>) {
    if let Some(mut child) = lock_session(session).take() {
        warn!("Killing unwatched core process {}", child.id());
        if let Err(e) = child.kill() {
            error!("Failed to kill core process: {}", e);
        }
        let _ = child.wait();
    }
}

impl EmulationCore for CommandCore {
    fn launch(&self, request: LaunchRequest, dispatcher: UiDispatcher) -> Result<(), LaunchError> {
        let started = {
            let mut slot = lock_session(&self.session);
            if slot.is_some() {
                return Err(LaunchError::AlreadyRunning);
            }
            let child = self
                .command(&request)
                .spawn()
                .map_err(|source| LaunchError::Spawn {
                    program: self.program.clone(),
                    source,
                })?;
            debug!("Core process {} started", child.id());
            *slot = Some(child);
            Instant::now()
        };
        let path = request.path;
        let session = self.session.clone();

        let spawned = thread::Builder::new()
            .name("title-session".to_string())
            .spawn(move || match watch_session(&session) {
                Ok(status) => {
                    if !status.success() {
                        warn!("Core exited with {}", status);
                    }
                    dispatcher.post(ShellMessage::TitleExited {
                        path,
                        played: started.elapsed(),
                    });
                }
                Err(e) => {
                    error!("Lost track of the core process: {}", e);
                    dispatcher.post(ShellMessage::TitleFailed {
                        path,
                        error: e.to_string(),
                    });
                }
            });

        if let Err(source) = spawned {
            abandon_session(&self.session);
            return Err(LaunchError::Spawn {
                program: self.program.clone(),
                source,
            });
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), LaunchError> {
        let mut slot = lock_session(&self.session);
        let child = slot.as_mut().ok_or(LaunchError::NotRunning)?;
        info!("Stopping core process {}", child.id());
        child.kill().map_err(LaunchError::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directory_prefers_istorage_over_romfs() {
        let tmp = tempdir().unwrap();
        assert_eq!(LoadKind::detect(tmp.path()).unwrap(), LoadKind::Cart);

        fs::write(tmp.path().join("data.romfs"), "").unwrap();
        assert_eq!(
            LoadKind::detect(tmp.path()).unwrap(),
            LoadKind::CartWithRomFs {
                romfs: tmp.path().join("data.romfs")
            }
        );

        fs::write(tmp.path().join("data.istorage"), "").unwrap();
        assert_eq!(
            LoadKind::detect(tmp.path()).unwrap(),
            LoadKind::CartWithRomFs {
                romfs: tmp.path().join("data.istorage")
            }
        );
    }

    #[test]
    fn files_dispatch_on_extension() {
        let tmp = tempdir().unwrap();
        let cases = [
            ("a.XCI", LoadKind::Xci),
            ("b.nca", LoadKind::Nca),
            ("c.nsp", LoadKind::Nsp),
            ("d.pfs0", LoadKind::Nsp),
            ("e.nro", LoadKind::Homebrew),
            ("f", LoadKind::Homebrew),
        ];
        for (name, expected) in cases {
            let path = tmp.path().join(name);
            fs::write(&path, "").unwrap();
            assert_eq!(LoadKind::detect(&path).unwrap(), expected, "{name}");
        }
    }

    #[test]
    fn missing_path_is_an_error() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("nothing.nsp");
        assert!(matches!(
            LaunchRequest::new(missing, Vec::new()),
            Err(LaunchError::NotFound(_))
        ));
    }

    #[test]
    fn command_carries_controllers_and_path() {
        let tmp = tempdir().unwrap();
        let game = tmp.path().join("game.nsp");
        fs::write(&game, "").unwrap();
        let request = LaunchRequest::new(
            game.clone(),
            vec![(PlayerIndex::Player1, ControllerType::JoyconPair)],
        )
        .unwrap();

        let core = CommandCore::new(PathBuf::from("core"), vec!["--fullscreen".to_string()]);
        let command = core.command(&request);
        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--fullscreen".to_string(),
                "--load".to_string(),
                "nsp".to_string(),
                "--controller".to_string(),
                "Player1=JoyconPair".to_string(),
                game.to_string_lossy().into_owned(),
            ]
        );
    }

    #[cfg(unix)]
    fn sleeping_core() -> CommandCore {
        // sh takes the core arguments as positional parameters and ignores them
        CommandCore::new(
            PathBuf::from("sh"),
            vec!["-c".to_string(), "exec sleep 30".to_string()],
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stop_ends_the_running_title() {
        let tmp = tempdir().unwrap();
        let game = tmp.path().join("game.nsp");
        fs::write(&game, "").unwrap();
        let core = sleeping_core();
        assert!(matches!(core.stop(), Err(LaunchError::NotRunning)));

        let (dispatcher, mut inbox) = UiDispatcher::channel();
        core.launch(LaunchRequest::new(game.clone(), Vec::new()).unwrap(), dispatcher.clone())
            .unwrap();
        assert!(matches!(
            core.launch(LaunchRequest::new(game.clone(), Vec::new()).unwrap(), dispatcher),
            Err(LaunchError::AlreadyRunning)
        ));

        core.stop().unwrap();
        let message = tokio::time::timeout(Duration::from_secs(10), inbox.recv())
            .await
            .expect("session did not end after stop")
            .expect("inbox closed");
        match message {
            ShellMessage::TitleExited { path, played } => {
                assert_eq!(path, game);
                assert!(played < Duration::from_secs(30));
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert!(matches!(core.stop(), Err(LaunchError::NotRunning)));
    }

    #[cfg(unix)]
    #[test]
    fn abandoned_session_is_killed() {
        let session = Mutex::new(Some(Command::new("sleep").arg("30").spawn().unwrap()));
        let started = Instant::now();
        abandon_session(&session);
        assert!(session.lock().unwrap().is_none());
        assert!(started.elapsed() < Duration::from_secs(30));
    }
}
