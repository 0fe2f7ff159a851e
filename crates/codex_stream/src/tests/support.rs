#![cfg_attr(not(unix), allow(dead_code))]

use std::fs as std_fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub(super) fn write_fake_codex(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("codex");
    std_fs::write(&path, script).unwrap();
    let mut perms = std_fs::metadata(&path).unwrap().permissions();
    #[cfg(unix)]
    {
        perms.set_mode(0o755);
    }
    std_fs::set_permissions(&path, perms).unwrap();
    path
}

/// Shell script that prints each line verbatim and exits with `exit_code`.
pub(super) fn script_printing(lines: &[&str], exit_code: i32) -> String {
    let mut script = String::from("#!/bin/sh\n");
    for line in lines {
        script.push_str(&format!("printf '%s\\n' '{}'\n", line.replace('\'', r"'\''")));
    }
    script.push_str(&format!("exit {exit_code}\n"));
    script
}

/// True while `/proc/<pid>` exists and is not a zombie.
pub(super) fn process_alive(pid: u32) -> bool {
    let Ok(stat) = std_fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // Fields after the parenthesized command name start with the state letter.
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .is_some_and(|state| state != "Z" && state != "X")
}

pub(super) async fn wait_for_exit(pid: u32) -> bool {
    for _ in 0..100 {
        if !process_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

pub(super) async fn read_pid_file(path: &Path) -> u32 {
    for _ in 0..100 {
        if let Ok(contents) = std_fs::read_to_string(path) {
            if let Ok(pid) = contents.trim().parse() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("pid file {} never appeared", path.display());
}
