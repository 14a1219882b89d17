//! Configlet command handlers.

use std::path::Path;

use tabled::Tabled;

use cvpkit_api::Configlet;
use cvpkit_core::builder::{self, BuilderPaths, DeviceId};
use cvpkit_core::export::{self, Overwrite};
use cvpkit_core::sync::{self, SyncOptions, SyncOutcome, SyncSource};

use crate::cli::{ConfigletsArgs, ConfigletsCommand, GlobalOpts, RenderArgs, SyncArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ConfigletRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Lines")]
    lines: usize,
}

fn modified(c: &Configlet) -> String {
    chrono::DateTime::from_timestamp_millis(c.date_time_in_long_format)
        .filter(|_| c.date_time_in_long_format > 0)
        .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

impl From<&Configlet> for ConfigletRow {
    fn from(c: &Configlet) -> Self {
        Self {
            name: c.name.clone(),
            kind: c.kind.clone(),
            modified: modified(c),
            lines: c.config.lines().count(),
        }
    }
}

#[derive(Tabled)]
struct SyncRow {
    #[tabled(rename = "Configlet")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
}

impl From<&SyncOutcome> for SyncRow {
    fn from(o: &SyncOutcome) -> Self {
        let action = if o.dry_run {
            format!("{} (dry run)", o.action)
        } else {
            o.action.to_string()
        };
        Self {
            name: o.name.clone(),
            action,
        }
    }
}

// ── Option building ─────────────────────────────────────────────────

/// Flags first, then the `[sync]` config section.
fn sync_options(args: &SyncArgs, cfg: &Config) -> Result<SyncOptions, CliError> {
    let source = match (&args.dir, &args.repo) {
        (Some(dir), _) => SyncSource::Local(dir.clone()),
        (None, repo) => {
            let repo = repo
                .clone()
                .or_else(|| cfg.sync.repo.clone())
                .ok_or_else(|| CliError::Validation {
                    field: "repo".into(),
                    reason: "pass --repo or --dir, or set repo in the [sync] config section".into(),
                })?;
            SyncSource::Git {
                repo,
                branch: args.branch.clone().unwrap_or_else(|| cfg.sync.branch.clone()),
            }
        }
    };

    let mut opts = SyncOptions::new(source);
    opts.configlet_path = args.path.clone().unwrap_or_else(|| cfg.sync.path.clone());
    opts.ignore = if args.ignore.is_empty() {
        cfg.sync.ignore.clone()
    } else {
        args.ignore.clone()
    };
    opts.dry_run = args.dry_run;
    Ok(opts)
}

fn device_id(args: &RenderArgs) -> Result<DeviceId, CliError> {
    match (&args.serial, &args.mac) {
        (Some(serial), _) => Ok(DeviceId::Serial(serial.clone())),
        (None, Some(mac)) => Ok(DeviceId::Mac(mac.clone())),
        (None, None) => Err(CliError::Validation {
            field: "device".into(),
            reason: "pass --serial or --mac".into(),
        }),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn sync_configlets(args: &SyncArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let opts = sync_options(args, cfg)?;
    let connection = config::connection_config(global, cfg)?;
    let outcomes = sync::run(connection, config::retry_policy(&args.retry), &opts).await?;

    let out = output::render_list(&global.output, &outcomes, |o| SyncRow::from(o), |o| {
        format!("{} {}", o.action, o.name)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

fn export_parse(file: &Path, out_dir: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let mut ask = |path: &Path| {
        util::confirm(&format!("{} exists, overwrite?", path.display()), false).unwrap_or(false)
    };
    let overwrite = if global.yes {
        Overwrite::Always
    } else {
        Overwrite::Ask(&mut ask)
    };

    let written = export::parse_export(file, out_dir, overwrite)?;
    let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
    let out = output::render_single(
        &global.output,
        &paths,
        |p| p.iter().map(|f| format!("Created {f}")).collect::<Vec<_>>().join("\n"),
        |p| p.join("\n"),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(args: ConfigletsArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigletsCommand::Sync(args) => sync_configlets(&args, cfg, global).await,

        ConfigletsCommand::ExportParse { file, out_dir } => export_parse(&file, &out_dir, global),

        ConfigletsCommand::List => {
            let cvp = util::connect(cfg, global).await?;
            let configlets = cvp.portal().list_configlets().await;
            cvp.disconnect().await;

            let mut configlets = configlets.map_err(cvpkit_core::CoreError::from)?;
            configlets.sort_by(|a, b| a.name.cmp(&b.name));
            let out = output::render_list(&global.output, &configlets, |c| ConfigletRow::from(c), |c| {
                c.name.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigletsCommand::Get { name } => {
            let cvp = util::connect(cfg, global).await?;
            let configlet = cvp.portal().get_configlet_by_name(&name).await;
            cvp.disconnect().await;

            let configlet = configlet.map_err(|e| {
                if e.is_not_found() {
                    CliError::NotFound {
                        resource_type: "configlet".into(),
                        identifier: name.clone(),
                    }
                } else {
                    cvpkit_core::CoreError::from(e).into()
                }
            })?;
            let out = output::render_single(
                &global.output,
                &configlet,
                |c| c.config.trim_end().to_owned(),
                |c| c.config.trim_end().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigletsCommand::Render(args) => {
            let id = device_id(&args)?;
            let paths = BuilderPaths {
                data_dir: args.data_dir.clone(),
                template_dir: args.template_dir.clone(),
            };

            let cvp = util::connect(cfg, global).await?;
            let rendered = builder::build_configlet(cvp.portal(), &id, &paths).await;
            cvp.disconnect().await;

            let rendered = rendered?;
            let out = output::render_single(&global.output, &rendered, Clone::clone, Clone::clone);
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::path::PathBuf;

    use cvpkit_config::parse_config;
    use cvpkit_core::sync::SyncAction;

    use super::*;
    use crate::cli::RetryArgs;

    fn args() -> SyncArgs {
        SyncArgs {
            repo: None,
            branch: None,
            dir: None,
            path: None,
            ignore: vec![],
            dry_run: false,
            retry: RetryArgs {
                retry_delay: 60,
                max_attempts: None,
            },
        }
    }

    const SYNC_SECTION: &str = r#"
[sync]
repo = "https://git.example.com/net/configlets.git"
branch = "production"
path = "configlets"
"#;

    #[test]
    fn sync_falls_back_to_config_section() {
        let cfg = parse_config(SYNC_SECTION).unwrap();
        let opts = sync_options(&args(), &cfg).unwrap();
        assert_eq!(
            opts.source,
            SyncSource::Git {
                repo: "https://git.example.com/net/configlets.git".into(),
                branch: "production".into(),
            }
        );
        assert_eq!(opts.configlet_path, PathBuf::from("configlets"));
        assert_eq!(opts.ignore, vec!["readme.md"]);
    }

    #[test]
    fn local_dir_wins_over_repo() {
        let cfg = parse_config(SYNC_SECTION).unwrap();
        let mut a = args();
        a.dir = Some("/srv/configlets".into());
        a.ignore = vec!["NOTES.txt".into()];
        let opts = sync_options(&a, &cfg).unwrap();
        assert_eq!(opts.source, SyncSource::Local("/srv/configlets".into()));
        assert_eq!(opts.ignore, vec!["NOTES.txt"]);
    }

    #[test]
    fn sync_needs_a_source() {
        let cfg = parse_config("").unwrap();
        assert!(matches!(
            sync_options(&args(), &cfg),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn dry_run_rows_are_marked() {
        let row = SyncRow::from(&SyncOutcome {
            name: "leaf1-base".into(),
            action: SyncAction::Updated,
            dry_run: true,
        });
        assert_eq!(row.action, "updated (dry run)");
    }

    #[test]
    fn unset_timestamp_renders_as_dash() {
        assert_eq!(modified(&Configlet::default()), "-");
    }
}
