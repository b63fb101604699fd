//! End-to-end tests against the compiled plugin binary.

#[path = "../helpers/mod.rs"]
mod helpers;

use anyhow::Result;
use assert_cmd::prelude::*;
use helpers::http;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;

const IOSTAT_OUTPUT: &str = "Linux 4.2.0-25-generic (node1)\t04/01/16\t_x86_64_\t(4 CPU)\n\
    \n\
    avg-cpu:  %user   %nice %system %iowait  %steal   %idle\n\
    \x20          2.37    0.00    0.50    1.58    0.00   95.55\n\
    \n";

fn plugin_bin() -> Result<Command> {
    Ok(Command::cargo_bin("iowait-plugin")?)
}

/// Writes canned iostat output and a config file that replays it with `cat`.
fn fake_iostat_config(dir: &TempDir) -> Result<PathBuf> {
    let output_path = dir.path().join("iostat.out");
    std::fs::write(&output_path, IOSTAT_OUTPUT)?;

    let config_path = dir.path().join("iowait.toml");
    std::fs::write(
        &config_path,
        format!(
            "[source]\ncommand = \"cat\"\nargs = [\"{}\"]\n",
            output_path.display()
        ),
    )?;
    Ok(config_path)
}

async fn wait_for_socket(path: &Path) -> bool {
    for _ in 0..200 {
        if let Ok(metadata) = std::fs::metadata(path) {
            if metadata.file_type().is_socket() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

async fn assert_signal_shuts_down_cleanly(signal: Signal) -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = fake_iostat_config(&dir)?;
    let socket_path = dir.path().join("iowait.sock");

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_iowait-plugin"))
        .arg("--config")
        .arg(&config_path)
        .arg("--addr")
        .arg(&socket_path)
        .arg("--hostname")
        .arg("node1")
        .kill_on_drop(true)
        .spawn()?;

    assert!(wait_for_socket(&socket_path).await, "socket never appeared");

    let response = http::get(&socket_path, "/report").await?;
    assert_eq!(response.status, 200);
    let body = response.json()?;
    assert_eq!(
        body["Host"]["nodes"]["node1;<host>"]["metrics"]["iowait"]["samples"][0]["value"],
        1.58
    );

    let pid = Pid::from_raw(child.id().expect("child has a pid") as i32);
    kill(pid, signal)?;

    let status = tokio::time::timeout(Duration::from_secs(10), child.wait()).await??;
    assert!(status.success(), "exit status was {:?}", status);
    assert!(!socket_path.exists(), "socket file outlived the process");
    Ok(())
}

#[tokio::test]
async fn test_interrupt_removes_socket_and_exits_zero() -> Result<()> {
    assert_signal_shuts_down_cleanly(Signal::SIGINT).await
}

#[tokio::test]
async fn test_terminate_removes_socket_and_exits_zero() -> Result<()> {
    assert_signal_shuts_down_cleanly(Signal::SIGTERM).await
}

#[tokio::test]
async fn test_interrupt_during_slow_pre_flight_exits_zero_promptly() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("iowait.toml");
    std::fs::write(
        &config_path,
        "[source]\ncommand = \"sleep\"\nargs = [\"30\"]\n",
    )?;
    let socket_path = dir.path().join("iowait.sock");

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_iowait-plugin"))
        .arg("--config")
        .arg(&config_path)
        .arg("--addr")
        .arg(&socket_path)
        .kill_on_drop(true)
        .spawn()?;

    // Give the plugin time to install its handlers and start sampling.
    tokio::time::sleep(Duration::from_millis(700)).await;
    let pid = Pid::from_raw(child.id().expect("child has a pid") as i32);
    kill(pid, Signal::SIGINT)?;

    let status = tokio::time::timeout(Duration::from_secs(5), child.wait()).await??;
    assert!(status.success(), "exit status was {:?}", status);
    assert!(!socket_path.exists());
    Ok(())
}

#[test]
fn test_startup_fails_if_pre_flight_sample_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let socket_path = dir.path().join("iowait.sock");

    plugin_bin()?
        .arg("--addr")
        .arg(&socket_path)
        .arg("--iostat-command")
        .arg("false")
        .assert()
        .failure()
        .stderr(predicates::str::contains("Pre-flight sample failed"));

    assert!(!socket_path.exists());
    Ok(())
}

#[test]
fn test_startup_fails_if_iostat_is_missing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let socket_path = dir.path().join("iowait.sock");

    plugin_bin()?
        .arg("--addr")
        .arg(&socket_path)
        .arg("--iostat-command")
        .arg("/nonexistent/iostat")
        .assert()
        .failure()
        .stderr(predicates::str::contains("failed to run /nonexistent/iostat"));

    assert!(!socket_path.exists());
    Ok(())
}

#[test]
fn test_startup_fails_if_socket_cannot_be_bound() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = fake_iostat_config(&dir)?;
    let socket_path = dir.path().join("missing").join("iowait.sock");

    plugin_bin()?
        .arg("--config")
        .arg(&config_path)
        .arg("--addr")
        .arg(&socket_path)
        .assert()
        .failure()
        .stderr(predicates::str::contains("Failed to bind unix socket"));

    Ok(())
}

#[test]
fn test_startup_fails_on_unreadable_config() -> Result<()> {
    plugin_bin()?
        .arg("--config")
        .arg("/nonexistent/iowait.toml")
        .assert()
        .failure()
        .stderr(predicates::str::contains("Configuration file not found"));
    Ok(())
}
