use chrono::DateTime;
use std::io::Write;
use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn commit_date(timestamp: &str) -> Option<String> {
    let seconds = timestamp.parse::<i64>().ok()?;
    let date = DateTime::from_timestamp(seconds, 0)?;
    Some(date.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sha = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    let date = git(&["log", "-1", "--format=%ct"])
        .as_deref()
        .and_then(commit_date)
        .unwrap_or_else(|| "unknown".to_string());

    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "cargo:rustc-env=APP_VERSION={} ({} {})",
        env!("CARGO_PKG_VERSION"),
        sha,
        date
    )?;
    writeln!(stdout, "cargo:rerun-if-changed=.git/HEAD")?;

    Ok(())
}
