//! Process spawning capability
//!
//! [`SystemSpawner`] starts real processes, each in a new process group so
//! an interrupt can reach the whole subprocess tree without touching the
//! launcher. Tests substitute [`crate::mock::MockSpawner`].

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

/// One external command to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub work_dir: Option<PathBuf>,
    /// Replaces the inherited environment when set
    pub env: Option<Vec<(String, String)>>,
    /// Written to the child's stdin, which is then closed
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program and arguments as one line, for logs and assertions.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Value of `key` in the explicit environment, if any.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .as_ref()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Starts processes and signals their process groups
pub trait Spawner: Send + Sync {
    /// Start `invocation` as the leader of a new process group.
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn RunningProcess>>;

    /// Deliver SIGINT to every process in group `pgid`.
    fn interrupt_group(&self, pgid: u32) -> io::Result<()>;
}

/// A spawned process that can be waited on
pub trait RunningProcess: Send {
    /// Process id, which is also its process group id
    fn pid(&self) -> u32;

    /// Block until exit, returning the exit code.
    ///
    /// A process killed by signal `n` reports `128 + n`.
    fn wait(&mut self) -> io::Result<i32>;
}

/// Spawns real OS processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpawner;

impl Spawner for SystemSpawner {
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn RunningProcess>> {
        let program = match invocation.env {
            // std looks a bare name up on the child's PATH, so one missing
            // from the replacement env must resolve against ours.
            Some(ref env) if !env.iter().any(|(k, _)| k == "PATH") => {
                resolve_program(&invocation.program, std::env::var_os("PATH").as_deref())
            }
            _ => PathBuf::from(&invocation.program),
        };
        let mut command = Command::new(program);
        command
            .args(&invocation.args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(ref dir) = invocation.work_dir {
            command.current_dir(dir);
        }
        if let Some(ref env) = invocation.env {
            command.env_clear().envs(env.iter().map(|(k, v)| (k, v)));
        }
        command.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn()?;

        // Fed from a thread so a child that fills its stdout before reading
        // stdin cannot deadlock us.
        let stdin_writer = match (child.stdin.take(), invocation.stdin.clone()) {
            (Some(mut pipe), Some(payload)) => Some(std::thread::spawn(move || {
                pipe.write_all(payload.as_bytes())
            })),
            _ => None,
        };

        Ok(Box::new(SystemProcess {
            child,
            stdin_writer,
        }))
    }

    #[cfg(unix)]
    fn interrupt_group(&self, pgid: u32) -> io::Result<()> {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::{getpgrp, Pid};

        let pgid = Pid::from_raw(pgid as i32);
        if pgid.as_raw() <= 1 || pgid == getpgrp() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to signal process group {}", pgid),
            ));
        }
        killpg(pgid, Signal::SIGINT).map_err(io::Error::from)
    }

    #[cfg(not(unix))]
    fn interrupt_group(&self, _pgid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "process group signals are not supported on this platform",
        ))
    }
}

/// Locate a bare program name on `search_path`.
///
/// Names containing a separator, and names not found, are returned as is.
pub fn resolve_program(program: &str, search_path: Option<&OsStr>) -> PathBuf {
    if program.contains(['/', std::path::MAIN_SEPARATOR]) {
        return PathBuf::from(program);
    }
    search_path
        .into_iter()
        .flat_map(std::env::split_paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
        .unwrap_or_else(|| PathBuf::from(program))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

struct SystemProcess {
    child: Child,
    stdin_writer: Option<JoinHandle<io::Result<()>>>,
}

impl RunningProcess for SystemProcess {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn wait(&mut self) -> io::Result<i32> {
        let status = self.child.wait()?;

        if let Some(writer) = self.stdin_writer.take() {
            match writer.join() {
                Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
                Ok(_) => {}
                Err(_) => return Err(io::Error::other("stdin writer panicked")),
            }
        }

        Ok(exit_code(status))
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("docker").arg("build").args(["-t", "img"]);
        assert_eq!(inv.command_line(), "docker build -t img");
        assert!(inv.env_var("PATH").is_none());
    }

    #[test]
    fn test_system_spawner_exit_code() {
        let inv = Invocation::new("/bin/sh").args(["-c", "exit 77"]);
        let mut process = SystemSpawner.spawn(&inv).unwrap();
        assert_eq!(process.wait().unwrap(), 77);
    }

    #[test]
    fn test_system_spawner_feeds_stdin_and_env() {
        let mut inv = Invocation::new("/bin/sh").args([
            "-c",
            r#"read line; [ "$line" = "payload" ] && [ "$FOO" = "bar" ]"#,
        ]);
        inv.stdin = Some("payload\n".to_string());
        inv.env = Some(vec![("FOO".to_string(), "bar".to_string())]);

        let mut process = SystemSpawner.spawn(&inv).unwrap();
        assert_eq!(process.wait().unwrap(), 0);
    }

    #[test]
    fn test_child_runs_in_own_process_group() {
        let inv = Invocation::new("/bin/sleep").arg("5");
        let mut process = SystemSpawner.spawn(&inv).unwrap();
        let pid = process.pid();

        let child_pgid =
            nix::unistd::getpgid(Some(nix::unistd::Pid::from_raw(pid as i32))).unwrap();
        assert_eq!(child_pgid.as_raw() as u32, pid);
        assert_ne!(child_pgid, nix::unistd::getpgrp());

        SystemSpawner.interrupt_group(pid).unwrap();
        assert_eq!(process.wait().unwrap(), 128 + sigint());
    }

    #[test]
    fn test_refuses_own_process_group() {
        let own = nix::unistd::getpgrp().as_raw() as u32;
        assert!(SystemSpawner.interrupt_group(own).is_err());
    }

    /// `name` in `dir`, linked to the system shell
    fn fake_program(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::os::unix::fs::symlink("/bin/sh", &path).unwrap();
        path
    }

    #[test]
    fn test_resolve_program_on_search_path() {
        let empty = tempfile::TempDir::new().unwrap();
        let bin = tempfile::TempDir::new().unwrap();
        let fake = fake_program(bin.path(), "fakedocker");
        std::fs::write(empty.path().join("fakedocker"), "not executable").unwrap();

        let search = std::env::join_paths([empty.path(), bin.path()]).unwrap();
        assert_eq!(resolve_program("fakedocker", Some(search.as_os_str())), fake);
        assert_eq!(
            resolve_program("missing-program", Some(search.as_os_str())),
            PathBuf::from("missing-program")
        );
        assert_eq!(
            resolve_program("/bin/sh", Some(search.as_os_str())),
            PathBuf::from("/bin/sh")
        );
        assert_eq!(resolve_program("fakedocker", None), PathBuf::from("fakedocker"));
    }

    #[test]
    fn test_explicit_path_in_child_env_is_used() {
        let bin = tempfile::TempDir::new().unwrap();
        fake_program(bin.path(), "fakedocker");

        let mut inv = Invocation::new("fakedocker").args(["-c", "exit 3"]);
        inv.env = Some(vec![(
            "PATH".to_string(),
            bin.path().to_string_lossy().into_owned(),
        )]);
        let mut process = SystemSpawner.spawn(&inv).unwrap();
        assert_eq!(process.wait().unwrap(), 3);
    }

    fn sigint() -> i32 {
        nix::sys::signal::Signal::SIGINT as i32
    }
}
