mod flow_builder;
mod trex;

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use nix::errno::Errno;

use crate::supervisor::{ProcState, ProcessEntry, ProcessError, ProcessHost};

pub(crate) fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "trafficgen-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// 派生后新进程的表现
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpawnBehavior {
    /// 以给定名字出现在进程表中
    Stays,
    /// 立即退出，不出现在进程表中
    Crashes,
    /// 派生本身失败
    Fails,
}

#[derive(Debug, Default)]
struct FakeState {
    table: Vec<ProcessEntry>,
    next_pid: u32,
    reaped: Vec<u32>,
    terminated: Vec<u32>,
    spawned: Vec<Vec<String>>,
}

/// 内存进程表
#[derive(Debug)]
pub(crate) struct FakeHost {
    state: Mutex<FakeState>,
    spawn_name: String,
    spawn: SpawnBehavior,
    refuse_terminate: Vec<u32>,
    spawn_delay: Duration,
    spawns_in_flight: AtomicUsize,
    spawns_overlapped: AtomicBool,
}

impl FakeHost {
    pub fn new(spawn_name: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_pid: 1000,
                ..FakeState::default()
            }),
            spawn_name: spawn_name.to_string(),
            spawn: SpawnBehavior::Stays,
            refuse_terminate: Vec::new(),
            spawn_delay: Duration::ZERO,
            spawns_in_flight: AtomicUsize::new(0),
            spawns_overlapped: AtomicBool::new(false),
        }
    }

    /// 每次派生前停顿，放大并发窗口
    pub fn with_spawn_delay(mut self, delay: Duration) -> Self {
        self.spawn_delay = delay;
        self
    }

    /// 是否出现过两次派生同时进行
    pub fn spawns_overlapped(&self) -> bool {
        self.spawns_overlapped.load(Ordering::SeqCst)
    }

    pub fn with_spawn(mut self, spawn: SpawnBehavior) -> Self {
        self.spawn = spawn;
        self
    }

    /// 向这些 pid 发信号时返回 EPERM
    pub fn refusing_terminate(mut self, pids: &[u32]) -> Self {
        self.refuse_terminate = pids.to_vec();
        self
    }

    pub fn with_process(self, pid: u32, name: &str, state: ProcState) -> Self {
        self.state.lock().unwrap().table.push(ProcessEntry {
            pid,
            name: name.to_string(),
            state,
        });
        self
    }

    pub fn reaped(&self) -> Vec<u32> {
        self.state.lock().unwrap().reaped.clone()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.state.lock().unwrap().terminated.clone()
    }

    pub fn spawned(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().spawned.clone()
    }

    pub fn pids(&self) -> Vec<u32> {
        let state = self.state.lock().unwrap();
        state.table.iter().map(|e| e.pid).collect()
    }
}

impl ProcessHost for FakeHost {
    fn processes(&self) -> Vec<ProcessEntry> {
        self.state.lock().unwrap().table.clone()
    }

    fn reap(&self, pid: u32) {
        let mut state = self.state.lock().unwrap();
        state.reaped.push(pid);
        state
            .table
            .retain(|e| !(e.pid == pid && e.state == ProcState::Zombie));
    }

    fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        if self.refuse_terminate.contains(&pid) {
            return Err(ProcessError::Signal {
                pid,
                source: Errno::EPERM,
            });
        }
        let mut state = self.state.lock().unwrap();
        state.terminated.push(pid);
        state.table.retain(|e| e.pid != pid);
        Ok(())
    }

    fn spawn_detached(&self, argv: &[String]) -> Result<u32, ProcessError> {
        if argv.is_empty() {
            return Err(ProcessError::EmptyArgv);
        }
        if self.spawns_in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.spawns_overlapped.store(true, Ordering::SeqCst);
        }
        if !self.spawn_delay.is_zero() {
            thread::sleep(self.spawn_delay);
        }
        let result = self.record_spawn(argv);
        self.spawns_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl FakeHost {
    fn record_spawn(&self, argv: &[String]) -> Result<u32, ProcessError> {
        let mut state = self.state.lock().unwrap();
        state.spawned.push(argv.to_vec());
        match self.spawn {
            SpawnBehavior::Fails => Err(ProcessError::Spawn {
                program: argv[0].clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
            SpawnBehavior::Crashes => {
                state.next_pid += 1;
                Ok(state.next_pid)
            }
            SpawnBehavior::Stays => {
                state.next_pid += 1;
                let pid = state.next_pid;
                let name = self.spawn_name.clone();
                state.table.push(ProcessEntry {
                    pid,
                    name,
                    state: ProcState::Alive,
                });
                Ok(pid)
            }
        }
    }
}
