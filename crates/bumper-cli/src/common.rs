use crate::options::{self, Command};
use bumper::{
    api::github::GitHub,
    config::{self, MergeWith},
    logging::short_sha,
    tags::{self, VersionTag},
    Bump, BumpError, Bumper,
};
use color_eyre::eyre::{self, WrapErr};
use colored::Colorize;
use std::process::ExitCode;

fn version_tag_json(version_tag: &VersionTag) -> serde_json::Value {
    serde_json::json!({
        "tag": version_tag.tag.name,
        "version": version_tag.serialized,
        "commit_sha": version_tag.tag.commit_sha,
    })
}

async fn load_config(options: &options::Options) -> eyre::Result<config::FinalizedConfig> {
    let color_choice = options.color_choice.unwrap_or(termcolor::ColorChoice::Auto);
    let cwd = std::env::current_dir().wrap_err("could not determine current working dir")?;
    let dir = options.dir.as_deref().unwrap_or(&cwd);
    let dir = dir
        .canonicalize()
        .wrap_err_with(|| format!("could not find directory {}", dir.display()))?;

    let printer = bumper::diagnostics::Printer::stderr(Some(color_choice));
    let mut config = config::Config {
        global: options::global_cli_config(options)?,
        ..config::Config::default()
    };

    match bumper::find_config(&dir, options.config_file.as_deref(), &printer).await? {
        Some((config_file, file_config)) => {
            tracing::info!(%config_file, "using config file");
            config.merge_with(&file_config);
        }
        None => tracing::debug!(?dir, "no config file found"),
    }
    Ok(config.finalize())
}

pub async fn bumper(options: options::Options) -> eyre::Result<ExitCode> {
    let start = std::time::Instant::now();

    let color_choice = options.color_choice.unwrap_or(termcolor::ColorChoice::Auto);
    crate::logging::setup(options.log_level, options.log_format, color_choice)?;
    colored::control::set_override(crate::logging::use_color(color_choice));

    let config = load_config(&options).await?;
    let repo = config
        .global
        .repo
        .clone()
        .ok_or(BumpError::<GitHub>::MissingRepo)?;
    let token = options::token(&options);
    let host = GitHub::new(&config.global.api_url, repo, token.as_deref())?;
    tracing::debug!(repo = %host.repo(), authenticated = token.is_some(), "github");

    let logger = crate::verbose::Logger::new(options.verbosity.level());
    let tag_name = config.global.tag_name.clone();
    let manager = Bumper::new(host, config, logger);

    let exit_code = match options.command {
        Command::List { all, json } => {
            let listing = manager.list().await?;
            if json {
                let output = if all {
                    serde_json::to_value(&listing.tags)?
                } else {
                    listing.version_tags.iter().map(version_tag_json).collect()
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if all {
                for tag in &listing.tags {
                    let version = listing
                        .version_tags
                        .iter()
                        .find(|version_tag| version_tag.tag.name == tag.name)
                        .map(|version_tag| version_tag.serialized.as_str())
                        .unwrap_or_default();
                    println!(
                        "{}\t{}\t{}",
                        tag.name.yellow(),
                        short_sha(&tag.commit_sha).cyan(),
                        version
                    );
                }
            } else if listing.version_tags.is_empty() {
                eprintln!("no version tags matching {}", tags::glob_for(&tag_name));
            } else {
                for version_tag in &listing.version_tags {
                    println!(
                        "{}\t{}\t{}",
                        version_tag.tag.name.yellow(),
                        short_sha(&version_tag.tag.commit_sha).cyan(),
                        version_tag.serialized
                    );
                }
            }
            ExitCode::SUCCESS
        }
        Command::Latest { json } => match manager.latest().await? {
            Some(latest) if json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&version_tag_json(&latest))?
                );
                ExitCode::SUCCESS
            }
            Some(latest) => {
                println!("{}", latest.serialized);
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("no version tags matching {}", tags::glob_for(&tag_name));
                ExitCode::FAILURE
            }
        },
        Command::Bump(bump) => {
            let bump = match (bump.new_version.as_deref(), bump.component.as_deref()) {
                (Some(new_version), _) => Bump::NewVersion(new_version),
                (None, Some(component)) => Bump::Component(component),
                (None, None) => eyre::bail!("missing version component to bump"),
            };
            let outcome = manager.bump(bump).await?;
            tracing::info!(
                current = outcome.current_version,
                new = outcome.new_version,
                reference = outcome.target.reference,
                "bumped"
            );
            ExitCode::SUCCESS
        }
        Command::Create {
            name,
            reference,
            message,
            force,
        } => {
            manager
                .create(&name, reference.as_deref(), message.as_deref(), force)
                .await?;
            ExitCode::SUCCESS
        }
        Command::Move { name, reference } => {
            manager.move_tag(&name, &reference).await?;
            ExitCode::SUCCESS
        }
        Command::Delete { names } => {
            manager.delete(names.as_slice()).await?;
            ExitCode::SUCCESS
        }
    };

    tracing::info!(elapsed = ?start.elapsed(), "done");
    Ok(exit_code)
}
