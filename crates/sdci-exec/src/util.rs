use std::process::ExitStatus;

use tokio::process::Command;

/// `program argv[1..]`, with nothing inherited on stdin.
pub fn cmd_program(argv: &[String]) -> Option<Command> {
    let (program, args) = argv.split_first()?;
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd.stdin(std::process::Stdio::null());
    Some(cmd)
}

/// Put the child in its own process group so the whole tree can be signalled.
#[cfg(unix)]
pub fn isolate_group(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(not(unix))]
pub fn isolate_group(_cmd: &mut Command) {}

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
pub fn kill_group(pid: u32) -> std::io::Result<()> {
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn kill_group(_pid: u32) -> std::io::Result<()> {
    Ok(())
}

/// Exit code, or the negated signal number for signal-terminated processes.
pub fn exit_code(status: &ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.code().or_else(|| status.signal().map(|sig| -sig))
    }

    #[cfg(not(unix))]
    {
        status.code()
    }
}
