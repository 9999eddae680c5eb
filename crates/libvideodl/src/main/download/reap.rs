//! Module for snapshotting and terminating stuck child processes

use std::collections::HashSet;

use sysinfo::{
	Pid,
	ProcessesToUpdate,
	Signal,
	System,
};

/// Snapshot the PIDs of all direct children of this process.
/// On enumeration failure the set is simply empty and reaping becomes a no-op.
#[must_use]
pub fn child_pids() -> HashSet<Pid> {
	let mut system = System::new();
	system.refresh_processes(ProcessesToUpdate::All, true);

	let self_pid = Pid::from_u32(std::process::id());

	return system
		.processes()
		.iter()
		.filter(|(_, process)| return process.parent() == Some(self_pid))
		.map(|(pid, _)| return *pid)
		.collect();
}

/// Terminate direct children that appeared since the given snapshot.
///
/// The snapshot / diff keeps unrelated children alive, only processes the
/// stuck extraction spawned are signalled. SIGTERM where the platform
/// supports it, plain kill otherwise.
pub fn reap_new_children(before: &HashSet<Pid>) {
	let mut system = System::new();
	system.refresh_processes(ProcessesToUpdate::All, true);

	let self_pid = Pid::from_u32(std::process::id());

	for (pid, process) in system.processes() {
		if process.parent() != Some(self_pid) || before.contains(pid) {
			continue;
		}

		debug!("Terminating stuck child process {pid}");

		if process.kill_with(Signal::Term).is_none() {
			// platform without SIGTERM support
			process.kill();
		}
	}
}
