use std::process::ExitCode;

use owo_colors::OwoColorize;
use serde_json::{json, Value};
use xmrig_ui_daemon::{Endpoint, Interrupt, RunMode, ServiceStatus, StartOptions, StartOutcome, StatusReport, StopOutcome};

use super::{exit_code, CommandError, Context};
use crate::cli::EndpointArgs;
use crate::output::{error_payload, format_bytes, format_uptime, Output};

pub fn start(ctx: &Context, args: &EndpointArgs, daemon: bool) -> Result<ExitCode, CommandError> {
	let lifecycle = ctx.lifecycle()?;
	let endpoint = ctx.config.preview.endpoint(args.port, args.host.as_deref());
	let mode = if daemon { RunMode::Daemon } else { RunMode::Foreground };
	let options = StartOptions {
		endpoint: endpoint.clone(),
		mode,
		verbose: ctx.verbose,
	};

	let out = ctx.out;
	if mode == RunMode::Foreground {
		out.note(&format!("starting preview server on {}", endpoint.url()));
	}
	let outcome = lifecycle.start_observed(&options, &mut |_: Interrupt| out.note("shutting down preview server..."))?;
	Ok(render_start(&out, &outcome, &endpoint))
}

pub fn stop(ctx: &Context) -> Result<ExitCode, CommandError> {
	let lifecycle = ctx.lifecycle()?;
	let outcome = lifecycle.stop()?;
	ctx.out.report(&stop_payload(&outcome), || match outcome {
		StopOutcome::NotRunning => println!("{} not running", "○".dimmed()),
		StopOutcome::Stopped { pid, forced: false } => println!("{} stopped (pid {})", "●".red(), pid),
		StopOutcome::Stopped { pid, forced: true } => {
			println!("{} stopped (pid {}, killed after timeout)", "●".red(), pid)
		}
		StopOutcome::Survived { pid } => {
			eprintln!("{} pid {} is still running after SIGKILL", "error:".red(), pid)
		}
	});
	Ok(ExitCode::SUCCESS)
}

pub fn restart(ctx: &Context, args: &EndpointArgs) -> Result<ExitCode, CommandError> {
	let lifecycle = ctx.lifecycle()?;
	let endpoint = ctx.config.preview.endpoint(args.port, args.host.as_deref());
	let options = StartOptions {
		endpoint: endpoint.clone(),
		mode: RunMode::Daemon,
		verbose: ctx.verbose,
	};

	ctx.out.note("restarting preview server...");
	let outcome = lifecycle.restart(&options)?;
	if let StopOutcome::Survived { pid } = outcome.stop {
		ctx.out.warn(&format!("previous process {} did not exit", pid));
	}
	Ok(render_start(&ctx.out, &outcome.start, &endpoint))
}

pub fn status(ctx: &Context) -> Result<ExitCode, CommandError> {
	let lifecycle = ctx.lifecycle()?;
	let report = lifecycle.status(&ctx.config.preview.endpoint(None, None));
	let payload = serde_json::to_value(&report).unwrap_or_else(|e| error_payload(&e.to_string()));
	ctx.out.report(&payload, || print_status(&report));
	Ok(ExitCode::SUCCESS)
}

fn render_start(out: &Output, outcome: &StartOutcome, endpoint: &Endpoint) -> ExitCode {
	out.report(&start_payload(outcome, endpoint), || match *outcome {
		StartOutcome::AlreadyRunning { pid } => {
			println!("{} already running (pid {}) at {}", "●".yellow(), pid, endpoint.url().cyan())
		}
		StartOutcome::Started { pid } => {
			println!("{} started (pid {}) at {}", "●".green(), pid, endpoint.url().cyan())
		}
		StartOutcome::Exited { code: Some(code) } if code != 0 && !out.quiet => {
			eprintln!("{}", format!("process exited with code {}", code).red())
		}
		StartOutcome::Exited { .. } => {}
	});
	match *outcome {
		// A signal-terminated child counts as a clean exit.
		StartOutcome::Exited { code } => exit_code(code.unwrap_or(0)),
		_ => ExitCode::SUCCESS,
	}
}

pub fn start_payload(outcome: &StartOutcome, endpoint: &Endpoint) -> Value {
	match *outcome {
		StartOutcome::AlreadyRunning { pid } => json!({
			"status": "already_running",
			"pid": pid,
			"url": endpoint.url(),
			"message": "XMRig Web UI is already running",
		}),
		StartOutcome::Started { pid } => json!({
			"status": "started",
			"mode": "daemon",
			"pid": pid,
			"url": endpoint.url(),
			"port": endpoint.port,
			"host": endpoint.host,
		}),
		StartOutcome::Exited { code } => json!({
			"status": "exited",
			"code": code.unwrap_or(0),
		}),
	}
}

pub fn stop_payload(outcome: &StopOutcome) -> Value {
	match *outcome {
		StopOutcome::NotRunning => json!({
			"status": "not_running",
			"message": "XMRig Web UI is not running",
		}),
		StopOutcome::Stopped { pid, forced } => json!({
			"status": "stopped",
			"pid": pid,
			"forced": forced,
		}),
		StopOutcome::Survived { pid } => json!({
			"status": "error",
			"pid": pid,
			"message": format!("process {} is still running after SIGKILL", pid),
		}),
	}
}

fn print_status(report: &StatusReport) {
	match &report.service {
		ServiceStatus::Running { pid, url } => {
			println!("{} {} (pid {}) at {}", "●".green(), "running".green(), pid, url.cyan())
		}
		ServiceStatus::Stopped => println!("{} {}", "●".red(), "stopped".red()),
	}

	let sys = &report.system;
	let label = |name: &str| format!("{:<9}", name).dimmed().to_string();
	println!("  {} {} ({})", label("platform"), sys.platform, sys.arch);
	println!("  {} {}", label("uptime"), format_uptime(sys.uptime));

	let mut memory = format!("{} of {} MiB available", sys.memory.available, sys.memory.total);
	if let Some(daemon) = sys.memory.daemon {
		memory.push_str(&format!(", server {} MiB", daemon));
	}
	println!("  {} {}", label("memory"), memory);

	let logs = &report.logs;
	if logs.exists {
		println!("  {} {} ({})", label("log"), logs.file.display(), format_bytes(logs.size));
	} else {
		println!("  {} {} {}", label("log"), logs.file.display(), "(missing)".dimmed());
	}
}
