// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use pipedesk_app::ViewKind;
use pipedesk_db::Store;
use runtime::{Command, DemoRows, ViewRuntime};
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `pipedesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    logging::init(config.log_level())?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let command = Command::parse(options.command.as_slice())?;
    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or {}",
            db_path.display(),
            pipedesk_db::DB_PATH_ENV
        )
    })?;
    store.bootstrap()?;

    let view = options.view.unwrap_or_else(|| config.default_view());
    let runtime = ViewRuntime::new(
        &store,
        DemoRows {
            count: config.demo_rows(),
            seed: config.demo_seed(),
        },
    );
    print!("{}", runtime.execute(view, &command)?);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    view: Option<ViewKind>,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    show_help: bool,
    command: Vec<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        view: None,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        show_help: false,
        command: Vec::new(),
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        // Everything after the first command word belongs to the command,
        // so labels such as `--draft--` survive intact.
        if !options.command.is_empty() {
            options.command.push(arg.as_ref().to_owned());
            continue;
        }
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--view" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--view requires contacts or deals"))?;
                let view = ViewKind::parse(value.as_ref()).ok_or_else(|| {
                    anyhow!(
                        "unknown view {:?}; use --view contacts or --view deals",
                        value.as_ref()
                    )
                })?;
                options.view = Some(view);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            flag if flag.starts_with('-') => {
                return Err(anyhow!(
                    "unknown argument {flag:?}; run with --help to see supported options"
                ));
            }
            word => options.command.push(word.to_owned()),
        }
    }

    Ok(options)
}

fn print_help() {
    println!("pipedesk [options] [command]");
    println!();
    println!("Options:");
    println!("  --config <path>          Use a specific config path");
    println!("  --view <contacts|deals>  Table view to configure (default from config)");
    println!("  --demo                   Use a throwaway in-memory database");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --help                   Show this help");
    println!();
    println!("Commands:");
    println!("  columns                  List columns in display order (default)");
    println!("  show-table [N]           Print N generated rows through the view");
    println!("  toggle <id>              Show or hide a column");
    println!("  rename <id> <label>      Rename a column");
    println!("  move <id> <index>        Move a column to a display position");
    println!("  sort <id> <asc|desc|none>");
    println!("                           Set a column's sort direction");
    println!("  cycle-sort <id>          Step a column through asc, desc, none");
    println!("  reset                    Restore the view's default columns");
    println!("  stored                   List saved column settings");
    println!("  forget                   Delete the view's saved column settings");
}
