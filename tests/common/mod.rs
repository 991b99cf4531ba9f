#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use tempfile::TempDir;

use spese::utils::persistence::Workspace;
use spese_core::FixedClock;

/// Keeps TempDir guards alive for the whole test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Returns a fresh, isolated application home.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()
}

/// Opens a workspace in `home` with the clock pinned to `now`.
pub fn open_at(home: &PathBuf, now: DateTime<Utc>) -> Workspace {
    Workspace::open_with_clock(home, Box::new(FixedClock(now))).expect("open workspace")
}

pub fn setup_test_env(now: DateTime<Utc>) -> (PathBuf, Workspace) {
    let home = temp_home();
    let workspace = open_at(&home, now);
    (home, workspace)
}
