use std::process::{Command, Stdio};

use crate::logging;

/// Case-insensitive needle identifying framework windows.
const FRAMEWORK_TITLE: &str = "streamlit";
/// Suffix the framework puts on browser window titles ("app · Streamlit").
const DISPLAY_NAME: &str = " Streamlit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHandle {
    pub id: String,
    pub title: String,
}

fn is_stale_app_window(title: &str, script_stem: &str) -> bool {
    title.to_lowercase().contains(FRAMEWORK_TITLE)
        && title.contains(script_stem)
        && title.contains(DISPLAY_NAME)
}

/// Windows left over from a previous launch of the same script: framework
/// windows intersected with windows carrying the script's file stem, kept
/// only when the title carries the framework display name.
pub fn select_stale_windows<'a>(
    windows: &'a [WindowHandle],
    script_stem: &str,
) -> Vec<&'a WindowHandle> {
    windows
        .iter()
        .filter(|window| is_stale_app_window(&window.title, script_stem))
        .collect()
}

/// Best-effort cleanup of an app window left open by a previous run. Every
/// failure degrades to a logged warning; the launch itself never depends on
/// this step.
pub fn close_stale_windows<F>(script_stem: &str, log: F)
where
    F: Fn(&str),
{
    let windows = match list_windows() {
        Ok(windows) => windows,
        Err(error) => {
            log(&format!("window cleanup skipped: {error}"));
            return;
        }
    };

    for window in select_stale_windows(&windows, script_stem) {
        match close_window(&window.id) {
            Ok(()) => log(&format!("closed stale app window '{}'", window.title)),
            Err(error) => log(&format!(
                "failed to close stale app window '{}': {}",
                window.title, error
            )),
        }
    }
}

/// Sends the platform's close-window chord to the focused window and then
/// terminates the calling process by PID. Wired to an in-app quit control.
pub fn close_app() -> ! {
    if let Err(error) = send_close_window_keys() {
        logging::warn(&format!("could not send close-window keys: {error}"));
    }
    terminate_current_process(std::process::id());
    std::process::exit(0)
}

fn run_silenced(command: &mut Command, name: &str) -> Result<(), String> {
    let status = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|error| format!("Failed to run '{name}': {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("'{name}' exited with {status}"))
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn list_windows() -> Result<Vec<WindowHandle>, String> {
    let output = Command::new("wmctrl")
        .arg("-l")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|error| format!("Failed to run 'wmctrl': {error}"))?;
    if !output.status.success() {
        return Err(format!("'wmctrl -l' exited with {}", output.status));
    }
    Ok(parse_wmctrl_list(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn close_window(id: &str) -> Result<(), String> {
    run_silenced(Command::new("wmctrl").args(["-i", "-c", id]), "wmctrl")
}

#[cfg(windows)]
fn list_windows() -> Result<Vec<WindowHandle>, String> {
    let script = r#"Get-Process | Where-Object { $_.MainWindowTitle } | ForEach-Object { "$($_.Id)`t$($_.MainWindowTitle)" }"#;
    let output = Command::new("powershell")
        .args(["-NoProfile", "-Command", script])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|error| format!("Failed to run 'powershell': {error}"))?;
    if !output.status.success() {
        return Err(format!("window listing exited with {}", output.status));
    }
    Ok(parse_tabbed_list(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(windows)]
fn close_window(id: &str) -> Result<(), String> {
    let script = format!("(Get-Process -Id {id}).CloseMainWindow() | Out-Null");
    run_silenced(
        Command::new("powershell").args(["-NoProfile", "-Command", &script]),
        "powershell",
    )
}

#[cfg(not(any(windows, all(unix, not(target_os = "macos")))))]
fn list_windows() -> Result<Vec<WindowHandle>, String> {
    Err("window enumeration is not supported on this platform".to_string())
}

#[cfg(not(any(windows, all(unix, not(target_os = "macos")))))]
fn close_window(_id: &str) -> Result<(), String> {
    Err("window close is not supported on this platform".to_string())
}

/// `wmctrl -l` lines: window id, desktop, host, then the title.
pub fn parse_wmctrl_list(raw: &str) -> Vec<WindowHandle> {
    raw.lines().filter_map(parse_wmctrl_line).collect()
}

fn split_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], &input[end..]))
}

fn parse_wmctrl_line(line: &str) -> Option<WindowHandle> {
    let (id, rest) = split_token(line)?;
    let (_desktop, rest) = split_token(rest)?;
    let (_host, rest) = split_token(rest)?;
    let title = rest.trim();
    if title.is_empty() {
        return None;
    }
    Some(WindowHandle {
        id: id.to_string(),
        title: title.to_string(),
    })
}

/// One `<id>\t<title>` record per line.
pub fn parse_tabbed_list(raw: &str) -> Vec<WindowHandle> {
    raw.lines()
        .filter_map(|line| {
            let (id, title) = line.split_once('\t')?;
            let title = title.trim();
            if id.trim().is_empty() || title.is_empty() {
                return None;
            }
            Some(WindowHandle {
                id: id.trim().to_string(),
                title: title.to_string(),
            })
        })
        .collect()
}

#[cfg(windows)]
fn send_close_window_keys() -> Result<(), String> {
    let script = "$shell = New-Object -ComObject WScript.Shell; $shell.SendKeys('%{F4}')";
    run_silenced(
        Command::new("powershell").args(["-NoProfile", "-Command", script]),
        "powershell",
    )
}

#[cfg(target_os = "macos")]
fn send_close_window_keys() -> Result<(), String> {
    run_silenced(
        Command::new("osascript").args([
            "-e",
            "tell application \"System Events\" to keystroke \"w\" using command down",
        ]),
        "osascript",
    )
}

#[cfg(all(unix, not(target_os = "macos")))]
fn send_close_window_keys() -> Result<(), String> {
    run_silenced(
        Command::new("xdotool").args(["key", "--clearmodifiers", "alt+F4"]),
        "xdotool",
    )
}

#[cfg(not(any(windows, unix)))]
fn send_close_window_keys() -> Result<(), String> {
    Err("close-window keys are not supported on this platform".to_string())
}

#[cfg(windows)]
fn terminate_current_process(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/f"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(unix)]
fn terminate_current_process(pid: u32) {
    // SIGTERM mirrors a polite OS-level terminate; exit(0) below is the
    // fallback if delivery is blocked.
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(any(windows, unix)))]
fn terminate_current_process(_pid: u32) {}
