use std::path::PathBuf;
use std::process::ExitCode;

use nix::unistd::{getuid, User};
use owo_colors::OwoColorize;
use serde_json::{json, Value};
use xmrig_ui_autostart::{
	AutostartController, AutostartError, AutostartState, AutostartStatus, DisableReport, EnableReport, Platform, ServiceSpec,
};
use xmrig_ui_daemon::{paths, Endpoint};

use super::{CommandError, Context};
use crate::cli::EndpointArgs;

pub fn enable(ctx: &Context, args: &EndpointArgs, delay: Option<u32>) -> Result<ExitCode, CommandError> {
	let controller = controller(ctx)?;
	let endpoint = ctx.config.preview.endpoint(args.port, args.host.as_deref());
	let exec_path = std::env::current_exe().map_err(CommandError::CurrentExe)?;
	let spec = service_spec(ctx, exec_path, &endpoint, delay)?;

	ctx.out.note("enabling autostart...");
	let report = controller.enable(&spec)?;
	ctx.out.report(&enable_payload(&report), || {
		println!("{} autostart enabled", "✓".green());
		println!("  {:<10} {}", "service", spec.display_name.cyan());
		println!("  {:<10} {}", "platform", report.platform.magenta());
		println!("  {:<10} {}", "delay", format!("{}s", spec.delay).yellow());
		println!("  {:<10} {}", "config", report.file.display().dimmed());
	});
	Ok(ExitCode::SUCCESS)
}

pub fn disable(ctx: &Context) -> Result<ExitCode, CommandError> {
	let controller = controller(ctx)?;
	let report = controller.disable(&ctx.config.autostart.name)?;
	ctx.out.report(&disable_payload(&report), || {
		if report.removed {
			println!("{} autostart disabled", "✓".green());
		} else {
			println!("{} autostart was not enabled", "○".dimmed());
		}
	});
	Ok(ExitCode::SUCCESS)
}

pub fn status(ctx: &Context) -> Result<ExitCode, CommandError> {
	let controller = controller(ctx)?;
	match controller.status(&ctx.config.autostart.name) {
		Ok(status) => {
			ctx.out.report(&json!({ "autostart": status }), || print_status(&status));
			Ok(ExitCode::SUCCESS)
		}
		Err(AutostartError::UnsupportedPlatform {
			platform: Platform::Unknown,
			..
		}) => {
			let payload = unsupported_payload();
			ctx.out.report(&payload, || {
				println!("{} Autostart is not supported on this platform", "⚠".yellow())
			});
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => Err(e.into()),
	}
}

fn controller(ctx: &Context) -> Result<AutostartController, CommandError> {
	let home = paths::home_dir().ok_or(CommandError::NoHome)?;
	Ok(AutostartController::new(home).verbose(ctx.verbose))
}

/// The descriptor re-invokes this binary in daemon mode.
pub fn service_spec(
	ctx: &Context,
	exec_path: PathBuf,
	endpoint: &Endpoint,
	delay: Option<u32>,
) -> Result<ServiceSpec, CommandError> {
	let cfg = &ctx.config.autostart;
	Ok(ServiceSpec {
		name: cfg.name.clone(),
		display_name: cfg.display_name.clone(),
		description: cfg.description.clone(),
		exec_path,
		args: vec![
			"start".to_string(),
			"--daemon".to_string(),
			"--port".to_string(),
			endpoint.port.to_string(),
			"--host".to_string(),
			endpoint.host.clone(),
		],
		working_dir: ctx.config.preview.project_dir()?,
		user: current_user(),
		delay: delay.unwrap_or(cfg.delay),
		log_file: ctx.runtime_paths().log_path(),
	})
}

fn current_user() -> String {
	User::from_uid(getuid())
		.ok()
		.flatten()
		.map(|u| u.name)
		.or_else(|| std::env::var("USER").ok())
		.unwrap_or_default()
}

pub fn enable_payload(report: &EnableReport) -> Value {
	json!({
		"status": "enabled",
		"platform": report.platform,
		"service": report.service,
	})
}

pub fn disable_payload(report: &DisableReport) -> Value {
	json!({
		"status": "disabled",
		"platform": report.platform,
		"removed": report.removed,
	})
}

fn unsupported_payload() -> Value {
	json!({
		"status": "unsupported",
		"platform": std::env::consts::OS,
		"message": "Autostart is not supported on this platform",
	})
}

fn print_status(status: &AutostartStatus) {
	println!("{}", "Autostart".bold());
	println!("  {:<10} {}", "platform", status.platform.magenta());
	let state = if status.enabled { "enabled".green().to_string() } else { "disabled".red().to_string() };
	println!("  {:<10} {}", "status", state);
	if let Some(active) = status.active {
		let active = if active { "active".green().to_string() } else { "inactive".dimmed().to_string() };
		println!("  {:<10} {}", "running", active);
	}
	println!("  {:<10} {}", "service", status.service.cyan());
	println!("  {:<10} {}", "descriptor", describe_state(status.state()));
	if let Some(kind) = status.kind {
		println!("  {:<10} {}", "type", kind.dimmed());
	}
	if let Some(file) = &status.file {
		println!("  {:<10} {}", "config", file.display().dimmed());
	}
}

fn describe_state(state: AutostartState) -> &'static str {
	match state {
		AutostartState::Absent => "not installed",
		AutostartState::InstalledInactive => "installed",
		AutostartState::InstalledActive => "installed, running",
	}
}
