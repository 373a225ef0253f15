//! Mock spawner for testing
//!
//! [`MockSpawner`] records every invocation and interrupt instead of
//! starting processes. Each spawn pops the next scripted [`MockExit`];
//! once the script runs out, processes exit 0.
//!
//! ```
//! use launcher::mock::{MockExit, MockSpawner};
//!
//! let spawner = MockSpawner::new(vec![MockExit::Code(77)]);
//! assert!(spawner.invocations().is_empty());
//! ```

use std::collections::{HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::run::{Invocation, RunningProcess, Spawner};

/// First pid handed out by the mock
pub const FIRST_MOCK_PID: u32 = 40_000;

/// Upper bound on how long an interruptible mock process waits
const INTERRUPT_WAIT_LIMIT: Duration = Duration::from_secs(10);

/// Scripted behavior of one mock process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockExit {
    /// Exit right away with this code
    Code(i32),
    /// Block until the process group is interrupted, then exit with this code
    OnInterrupt(i32),
    /// Fail to start
    SpawnError,
}

#[derive(Default)]
struct MockState {
    script: VecDeque<MockExit>,
    invocations: Vec<Invocation>,
    interrupts: Vec<u32>,
    interrupted: HashSet<u32>,
    spawn_listeners: Vec<Sender<u32>>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<MockState>,
    interrupted_cv: Condvar,
    next_pid: AtomicU32,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// In-memory [`Spawner`]
#[derive(Clone)]
pub struct MockSpawner {
    shared: Arc<Shared>,
}

impl MockSpawner {
    pub fn new(script: Vec<MockExit>) -> Self {
        let shared = Shared {
            next_pid: AtomicU32::new(FIRST_MOCK_PID),
            ..Shared::default()
        };
        shared.lock().script = script.into();
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Every invocation spawned so far, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.shared.lock().invocations.clone()
    }

    /// Every process group interrupted so far, in order
    pub fn interrupts(&self) -> Vec<u32> {
        self.shared.lock().interrupts.clone()
    }

    /// Receive the pid of each process spawned after this call.
    pub fn subscribe(&self) -> Receiver<u32> {
        let (tx, rx) = mpsc::channel();
        self.shared.lock().spawn_listeners.push(tx);
        rx
    }
}

impl Default for MockSpawner {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Spawner for MockSpawner {
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn RunningProcess>> {
        let mut state = self.shared.lock();
        let exit = state.script.pop_front().unwrap_or(MockExit::Code(0));
        if exit == MockExit::SpawnError {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock: {} not found", invocation.program),
            ));
        }

        let pid = self.shared.next_pid.fetch_add(1, Ordering::SeqCst);
        state.invocations.push(invocation.clone());
        state.spawn_listeners.retain(|tx| tx.send(pid).is_ok());

        Ok(Box::new(MockProcess {
            pid,
            exit,
            shared: Arc::clone(&self.shared),
        }))
    }

    fn interrupt_group(&self, pgid: u32) -> io::Result<()> {
        let mut state = self.shared.lock();
        state.interrupts.push(pgid);
        state.interrupted.insert(pgid);
        self.shared.interrupted_cv.notify_all();
        Ok(())
    }
}

struct MockProcess {
    pid: u32,
    exit: MockExit,
    shared: Arc<Shared>,
}

impl RunningProcess for MockProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn wait(&mut self) -> io::Result<i32> {
        match self.exit {
            MockExit::Code(code) => Ok(code),
            MockExit::SpawnError => Err(io::Error::other("mock process was never spawned")),
            MockExit::OnInterrupt(code) => {
                let pid = self.pid;
                let state = self.shared.lock();
                let (state, timeout) = self
                    .shared
                    .interrupted_cv
                    .wait_timeout_while(state, INTERRUPT_WAIT_LIMIT, |s| {
                        !s.interrupted.contains(&pid)
                    })
                    .map_err(|_| io::Error::other("mock state poisoned"))?;
                drop(state);
                if timeout.timed_out() {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("mock process {} was never interrupted", pid),
                    ));
                }
                Ok(code)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_default() {
        let spawner = MockSpawner::new(vec![MockExit::Code(3)]);
        let inv = Invocation::new("docker");

        assert_eq!(spawner.spawn(&inv).unwrap().wait().unwrap(), 3);
        assert_eq!(spawner.spawn(&inv).unwrap().wait().unwrap(), 0);
        assert_eq!(spawner.invocations().len(), 2);
    }

    #[test]
    fn test_distinct_pids() {
        let spawner = MockSpawner::default();
        let inv = Invocation::new("docker");
        let a = spawner.spawn(&inv).unwrap().pid();
        let b = spawner.spawn(&inv).unwrap().pid();
        assert_eq!(a, FIRST_MOCK_PID);
        assert_ne!(a, b);
    }

    #[test]
    fn test_spawn_error_not_recorded() {
        let spawner = MockSpawner::new(vec![MockExit::SpawnError]);
        assert!(spawner.spawn(&Invocation::new("docker")).is_err());
        assert!(spawner.invocations().is_empty());
    }

    #[test]
    fn test_on_interrupt_unblocks() {
        let spawner = MockSpawner::new(vec![MockExit::OnInterrupt(130)]);
        let mut process = spawner.spawn(&Invocation::new("docker")).unwrap();
        let pid = process.pid();

        let remote = spawner.clone();
        let handle = std::thread::spawn(move || remote.interrupt_group(pid));

        assert_eq!(process.wait().unwrap(), 130);
        handle.join().unwrap().unwrap();
        assert_eq!(spawner.interrupts(), vec![pid]);
    }

    #[test]
    fn test_subscribe_sees_spawns() {
        let spawner = MockSpawner::default();
        let rx = spawner.subscribe();
        let pid = spawner.spawn(&Invocation::new("docker")).unwrap().pid();
        assert_eq!(rx.recv().unwrap(), pid);
    }
}
