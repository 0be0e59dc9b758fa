use chrono::{DateTime, FixedOffset, TimeDelta};
use log::{error, info, warn};
use netatmo_schedule::config::{Config, OutputFormat};
use netatmo_schedule::models::ids::{HomeId, ModuleId, RoomId, ScheduleId, ZoneId};
use netatmo_schedule::models::netatmo::{HomeData, HomesData, Schedule};
use netatmo_schedule::models::status::HomeStatus;
use netatmo_schedule::source::{FileSource, SnapshotSource};
use netatmo_schedule::utils::{format_local, format_m_offset};
use netatmo_schedule::ModelError;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct LoadedEnvFile {
    path: PathBuf,
    explicit: bool,
}

/// How far ahead transitions are looked for.
const LOOKAHEAD_WEEKS: i64 = 52;

#[derive(Debug, Serialize)]
struct HomeReport {
    id: HomeId,
    name: String,
    timezone: String,
    reference: String,
    rooms: Vec<RoomReport>,
    modules: Vec<ModuleReport>,
    schedules: Vec<ScheduleReport>,
}

#[derive(Debug, Serialize)]
struct RoomReport {
    id: RoomId,
    name: String,
    reachable: Option<bool>,
    measured_temperature: Option<f64>,
    setpoint_temperature: Option<f64>,
    setpoint_mode: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModuleReport {
    id: ModuleId,
    name: String,
    module_type: String,
    room_id: Option<RoomId>,
    reachable: Option<bool>,
    battery_state: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScheduleReport {
    id: ScheduleId,
    name: String,
    schedule_type: String,
    selected: bool,
    active_zone: Option<String>,
    transitions: Vec<TransitionReport>,
    /// Set when the schedule could not be resolved.
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct TransitionReport {
    at: String,
    local: String,
    m_offset: i64,
    zone_id: ZoneId,
    zone: Option<String>,
}

fn model_err(context: &str) -> impl Fn(ModelError) -> String + '_ {
    move |e| format!("{}: {}", context, e)
}

fn room_reports(home: &HomeData<'_>, status: Option<&HomeStatus<'_>>) -> Result<Vec<RoomReport>, ModelError> {
    let statuses = status.map(|s| s.rooms()).transpose()?;
    let mut reports = Vec::new();
    for room in home.rooms()?.iter() {
        let room = room?;
        let id = room.id()?;
        let live = match &statuses {
            Some(rooms) => rooms.get_by_id(&id)?,
            None => None,
        };
        reports.push(RoomReport {
            id,
            name: room.name()?.to_string(),
            reachable: live.map(|r| r.reachable()).transpose()?.flatten(),
            measured_temperature: live.map(|r| r.measured_temperature()).transpose()?.flatten(),
            setpoint_temperature: live.map(|r| r.setpoint_temperature()).transpose()?.flatten(),
            setpoint_mode: live
                .map(|r| r.setpoint_mode())
                .transpose()?
                .flatten()
                .map(str::to_string),
        });
    }
    Ok(reports)
}

fn module_reports(home: &HomeData<'_>, status: Option<&HomeStatus<'_>>) -> Result<Vec<ModuleReport>, ModelError> {
    let statuses = status.map(|s| s.modules()).transpose()?;
    let mut reports = Vec::new();
    for module in home.modules()?.iter() {
        let module = module?;
        let id = module.id()?;
        let live = match &statuses {
            Some(modules) => modules.get_by_id(&id)?,
            None => None,
        };
        reports.push(ModuleReport {
            id,
            name: module.name()?.to_string(),
            module_type: module.module_type()?.to_string(),
            room_id: module.room_id()?,
            reachable: live.map(|m| m.reachable()).transpose()?.flatten(),
            battery_state: live
                .map(|m| m.battery_state())
                .transpose()?
                .flatten()
                .map(str::to_string),
        });
    }
    Ok(reports)
}

/// Active zone at `reference` and the next `count` transitions.
fn schedule_report(
    schedule: &Schedule<'_>,
    reference: &DateTime<FixedOffset>,
    count: usize,
) -> Result<ScheduleReport, ModelError> {
    let mut report = ScheduleReport {
        id: schedule.id()?,
        name: schedule.name()?.to_string(),
        schedule_type: schedule.schedule_type()?.as_str().to_string(),
        selected: schedule.view().find("selected")?.unwrap_or(false),
        active_zone: None,
        transitions: Vec::new(),
        error: None,
    };

    let index = schedule.index()?;
    let until = *reference + TimeDelta::weeks(LOOKAHEAD_WEEKS);
    let resolved = index.zone_at(reference).and_then(|zone| {
        report.active_zone = zone.map(|z| z.name().map(str::to_string)).transpose()?;
        for item in index.timetable().resolve_period_home(reference, &until, Some(count)) {
            let (at, timepoint) = item?;
            let zone = index.zone_of(&timepoint)?;
            report.transitions.push(TransitionReport {
                at: at.to_rfc3339(),
                local: format_local(&at),
                m_offset: timepoint.m_offset()?,
                zone_id: timepoint.zone_id()?,
                zone: zone.map(|z| z.name().map(str::to_string)).transpose()?,
            });
        }
        Ok(())
    });
    if let Err(e) = resolved {
        warn!("Schedule {} ({}) not resolved: {}", report.name, report.id, e);
        report.error = Some(e.to_string());
    }
    Ok(report)
}

fn home_report(
    source: &dyn SnapshotSource,
    home: &HomeData<'_>,
    reference: &DateTime<FixedOffset>,
    count: usize,
) -> Result<HomeReport, String> {
    let id = home.id().map_err(model_err("home id"))?;
    let tz = home.timezone().map_err(model_err("home timezone"))?;

    let status_node = source
        .home_status(&id)
        .map_err(|e| format!("loading status of home {} failed: {}", id, e))?;
    let status = status_node
        .as_ref()
        .map(HomeStatus::from_response)
        .transpose()
        .map_err(model_err("home status"))?;
    if status.is_none() {
        info!("No status snapshot for home {}", id);
    }

    let mut schedules = Vec::new();
    for schedule in home.schedules().map_err(model_err("schedules"))?.iter() {
        let schedule = schedule.map_err(model_err("schedule"))?;
        schedules.push(schedule_report(&schedule, reference, count).map_err(model_err("schedule"))?);
    }

    Ok(HomeReport {
        id,
        name: home.name().map_err(model_err("home name"))?.to_string(),
        timezone: tz.name().to_string(),
        reference: format_local(&reference.with_timezone(&tz)),
        rooms: room_reports(home, status.as_ref()).map_err(model_err("rooms"))?,
        modules: module_reports(home, status.as_ref()).map_err(model_err("modules"))?,
        schedules,
    })
}

fn render_text(reports: &[HomeReport]) -> String {
    let mut out = String::new();
    for home in reports {
        out.push_str(&format!("Home {} ({}) [{}] at {}\n", home.name, home.id, home.timezone, home.reference));
        for room in &home.rooms {
            let measured = room
                .measured_temperature
                .map(|t| format!("{:.1}°C", t))
                .unwrap_or_else(|| "-".to_string());
            let setpoint = room
                .setpoint_temperature
                .map(|t| format!("{:.1}°C", t))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "  room {}: measured {}, setpoint {} ({})\n",
                room.name,
                measured,
                setpoint,
                room.setpoint_mode.as_deref().unwrap_or("-")
            ));
        }
        for module in &home.modules {
            out.push_str(&format!(
                "  module {} [{}] {}{}\n",
                module.name,
                module.module_type,
                module.id,
                match module.reachable {
                    Some(false) => ", unreachable",
                    _ => "",
                }
            ));
        }
        for schedule in &home.schedules {
            let marker = if schedule.selected { ", selected" } else { "" };
            out.push_str(&format!("  schedule {} ({}{})", schedule.name, schedule.schedule_type, marker));
            match (&schedule.error, &schedule.active_zone) {
                (Some(e), _) => out.push_str(&format!(": {}\n", e)),
                (None, Some(zone)) => out.push_str(&format!(": {}\n", zone)),
                (None, None) => out.push_str(": unknown zone\n"),
            }
            for t in &schedule.transitions {
                out.push_str(&format!(
                    "    {}  {:<12} [{}]\n",
                    t.local,
                    t.zone.as_deref().unwrap_or("?"),
                    format_m_offset(t.m_offset)
                ));
            }
        }
    }
    out
}

pub fn run(cfg: &Config) -> Result<String, String> {
    let source = FileSource::new(&cfg.homes_data, cfg.home_status.clone());
    let homes_node = source.homes_data().map_err(|e| format!("loading homes data failed: {}", e))?;
    let homes = HomesData::from_response(&homes_node).map_err(model_err("homes data"))?;
    let reference = cfg.reference_or_now();
    info!("Reference instant {}", reference.to_rfc3339());

    let mut reports = Vec::new();
    for home in homes.iter() {
        let home = home.map_err(model_err("home"))?;
        let id = home.id().map_err(model_err("home id"))?;
        if cfg.home_id.is_some_and(|wanted| wanted != id) {
            continue;
        }
        reports.push(home_report(&source, &home, &reference, cfg.period_count.get())?);
    }

    if reports.is_empty() {
        return Err(match cfg.home_id {
            Some(id) => format!("home {} not found in {}", id, cfg.homes_data.display()),
            None => format!("{} lists no homes", cfg.homes_data.display()),
        });
    }

    match cfg.output {
        OutputFormat::Text => Ok(render_text(&reports)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&reports).map_err(|e| format!("rendering json failed: {}", e))
        }
    }
}

fn configure_env_from_cli() -> Result<Option<LoadedEnvFile>, String> {
    let mut env_file: Option<PathBuf> = None;
    let mut args = std::env::args_os().skip(1);

    while let Some(arg) = args.next() {
        let path = match arg.to_str() {
            Some("--env-file") => PathBuf::from(args.next().ok_or("`--env-file` requires a path argument")?),
            Some(s) if s.starts_with("--env-file=") => match &s["--env-file=".len()..] {
                "" => return Err("`--env-file` requires a path argument".to_string()),
                p => PathBuf::from(p),
            },
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        };
        if env_file.replace(path).is_some() {
            return Err("`--env-file` provided more than once".to_string());
        }
    }

    let (path, explicit) = match env_file {
        Some(path) if !path.is_file() => return Err(format!("env file not found: {}", path.display())),
        Some(path) => (path, true),
        None => {
            let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
            let path = cwd.join(".env");
            if !path.is_file() {
                return Ok(None);
            }
            (path, false)
        }
    };
    load_env_file(&path)?;
    Ok(Some(LoadedEnvFile { path, explicit }))
}

fn load_env_file(path: &Path) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    for (index, line) in text.lines().enumerate() {
        let assignment = parse_env_line(line).map_err(|e| format!("{}:{}: {}", path.display(), index + 1, e))?;
        if let Some((key, value)) = assignment {
            // The process environment wins over the file.
            if std::env::var_os(&key).is_none() {
                // Updating process-level environment variables is unsafe on some targets.
                unsafe {
                    std::env::set_var(key, value);
                }
            }
        }
    }
    Ok(())
}

/// `KEY=value`, `export KEY=value`, quoted values and `#` comments.
fn parse_env_line(line: &str) -> Result<Option<(String, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
    let (key, raw) = line.split_once('=').ok_or("missing '=' in assignment")?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(format!("invalid environment variable name: '{}'", key));
    }
    Ok(Some((key.to_string(), parse_env_value(raw.trim())?)))
}

fn parse_env_value(raw: &str) -> Result<String, String> {
    let Some(quote) = raw.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        let value = raw.split('#').next().unwrap_or_default();
        return Ok(value.trim_end().to_string());
    };

    let mut value = String::new();
    let mut chars = raw[1..].chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if quote == '"' => match chars.next() {
                Some('n') => value.push('\n'),
                Some('r') => value.push('\r'),
                Some('t') => value.push('\t'),
                Some(other) => value.push(other),
                None => return Err("unterminated escape sequence".to_string()),
            },
            c if c == quote => {
                let rest = chars.as_str().trim();
                if rest.is_empty() || rest.starts_with('#') {
                    return Ok(value);
                }
                return Err("unexpected characters after closing quote".to_string());
            }
            other => value.push(other),
        }
    }
    Err(format!("unterminated {} value", if quote == '"' { "double-quoted" } else { "single-quoted" }))
}

fn main() {
    let loaded_env = match configure_env_from_cli() {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!("Environment loaded from {} .env file: {}", origin, info.path.display());
    }

    info!(
        "netatmo-schedule {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );

    let result = Config::from_env().and_then(|cfg| run(&cfg));
    match result {
        Ok(report) => print!("{}", report),
        Err(e) => {
            error!("fatal: {}", e);
            std::process::exit(1);
        }
    }
}
