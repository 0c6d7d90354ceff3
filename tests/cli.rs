use std::fs;
use std::process::Command;

const PLOT: &str = env!("CARGO_BIN_EXE_emg_plot");
const SYNTH: &str = env!("CARGO_BIN_EXE_emg_synth");

// with the gui feature a missing -o opens a window instead
#[cfg(not(feature = "gui"))]
#[test]
fn synth_then_plot_with_default_output() {
    let dir = tempfile::tempdir().unwrap();
    let csvin = dir.path().join("trial.csv");
    let status = Command::new(SYNTH)
        .args(["-o", csvin.to_str().unwrap(), "-n", "100"])
        .status()
        .unwrap();
    assert!(status.success());

    let out = Command::new(PLOT)
        .args([csvin.to_str().unwrap(), "--dpi", "50", "--figsize", "4", "2"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let png = dir.path().join("trial.png");
    assert_eq!(&fs::read(&png).unwrap()[..4], b"\x89PNG");

    // a second run must not replace the derived output
    let before = fs::read(&png).unwrap();
    let out = Command::new(PLOT)
        .args([csvin.to_str().unwrap(), "--dpi", "20"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("already exists"));
    assert_eq!(fs::read(&png).unwrap(), before);

    // an explicit -o does
    let out = Command::new(PLOT)
        .args([csvin.to_str().unwrap(), "--dpi", "20", "-o", png.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_ne!(fs::read(&png).unwrap(), before);
}

#[test]
fn info_prints_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let csvin = dir.path().join("trial.csv");
    assert!(Command::new(SYNTH)
        .args(["-o", csvin.to_str().unwrap(), "-n", "10", "-r", "4"])
        .status()
        .unwrap()
        .success());
    let out = Command::new(PLOT)
        .args([csvin.to_str().unwrap(), "--info"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("File: trial.csv"));
    assert!(stdout.contains("Number of recordings: 4"));
    assert!(stdout.contains("Available channels: [1, 2]"));
    assert!(!dir.path().join("trial.png").exists());
}

#[test]
fn missing_input_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let out = Command::new(PLOT)
        .arg(dir.path().join("missing.csv"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Error"));
}
