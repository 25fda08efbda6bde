use std::path::Path;
use std::process::Command;

/// Hand a file to the operating system's default player.
///
/// Spawns and returns immediately; the child is not waited on. The
/// path may have come out of the portability remap, so it can point at
/// nothing; that surfaces as the player's own error, not ours.
pub fn open_in_default_player(path: &Path) -> std::io::Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        // The empty string is the window title `start` expects when the
        // next argument is quoted.
        c.args(["/C", "start", ""]).arg(path);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(path);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        c
    };
    command.spawn().map(|_| ())
}
