use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use colored::Colorize;
use nest_sdk::{row, tables, ClientConfig, Data, MockClient, Response, Row, DEMO_EMAIL};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

const DEFAULT_SESSION_DIR: &str = ".nest";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.session_dir.clone(), cli.instant)?;
    let client = MockClient::new(config)?;
    let format = cli.format.clone();
    match cli.command {
        Command::Demo(args) => cmd_demo(&client, args, &format).await,
        Command::Whoami => cmd_whoami(&client, &format),
        Command::SignIn(args) => cmd_sign_in(&client, args, &format).await,
        Command::SignOut => cmd_sign_out(&client).await,
    }
}

/// `--session-dir` wins over the config file; both fall back to `.nest`.
fn load_config(
    path: Option<&Path>,
    session_dir: Option<PathBuf>,
    instant: bool,
) -> anyhow::Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if instant {
        config = ClientConfig {
            session_dir: config.session_dir,
            seed_demo_profile: config.seed_demo_profile,
            ..ClientConfig::instant()
        };
    }
    config.session_dir = session_dir
        .or(config.session_dir)
        .or_else(|| Some(PathBuf::from(DEFAULT_SESSION_DIR)));
    debug!(
        config_file = ?path,
        session_dir = ?config.session_dir,
        query_latency_ms = config.query_latency.as_millis() as u64,
        auth_latency_ms = config.auth_latency.as_millis() as u64,
        "client config resolved"
    );
    Ok(config)
}

fn single_row(response: Response, what: &str) -> anyhow::Result<Row> {
    match response.into_result()? {
        Some(Data::Row(row)) => Ok(row),
        _ => Err(anyhow!("no {what} returned")),
    }
}

fn id_of(row: &Row) -> anyhow::Result<String> {
    row.id_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("row has no id"))
}

async fn cmd_demo(client: &MockClient, args: DemoArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let session = client
        .auth()
        .sign_in_with_password(DEMO_EMAIL, "demo")
        .await
        .context("demo sign-in failed")?;
    let owner = session.user_id().to_string();

    let trip = single_row(
        client
            .from(tables::TRIPS)
            .insert(row! {
                "name": (format!("{} getaway", args.destination)),
                "destination": (args.destination.clone()),
                "owner_id": (owner.clone())
            })
            .single()
            .execute()
            .await?,
        "trip",
    )?;
    let trip_id = id_of(&trip)?;

    client
        .from(tables::TRIP_MEMBERS)
        .insert(row! { "trip_id": (trip_id.clone()), "user_id": (owner.clone()), "role": "owner" })
        .execute()
        .await?;

    let days = client
        .from(tables::DAYS)
        .insert(
            (1..=args.days.max(1))
                .map(|n| row! { "trip_id": (trip_id.clone()), "day_number": (n) })
                .collect::<Vec<_>>(),
        )
        .execute()
        .await?
        .into_rows();
    let day_ids = days.iter().map(id_of).collect::<anyhow::Result<Vec<_>>>()?;
    let first_day = day_ids.first().cloned().ok_or_else(|| anyhow!("no days created"))?;

    let activities = client
        .from(tables::ACTIVITIES)
        .insert(vec![
            row! { "day_id": (first_day.clone()), "title": "Old town walk", "start_time": "14:00", "status": "planned" },
            row! { "day_id": (first_day.clone()), "title": "Breakfast at the market", "start_time": "09:00", "status": "planned" },
            row! { "day_id": (first_day.clone()), "title": "Sunset viewpoint", "start_time": "19:30", "status": "planned" },
        ])
        .execute()
        .await?
        .into_rows();
    let first_activity = activities
        .first()
        .map(id_of)
        .transpose()?
        .ok_or_else(|| anyhow!("no activities created"))?;

    client
        .from(tables::ACTIVITIES)
        .update(row! { "status": "booked" })
        .filter_eq("id", first_activity.clone())
        .single()
        .execute()
        .await?;

    client
        .from(tables::ACTIVITY_COMMENTS)
        .insert(row! { "activity_id": (first_activity.clone()), "user_id": (owner.clone()), "comment": "Wear comfy shoes" })
        .execute()
        .await?;

    let schedule = client
        .from(tables::ACTIVITIES)
        .select("title, start_time, status")
        .filter_eq("day_id", first_day.clone())
        .order("start_time")
        .execute()
        .await?
        .into_rows();

    let comments = client
        .from(tables::ACTIVITY_COMMENTS)
        .select("comment, profiles(email)")
        .filter_eq("activity_id", first_activity)
        .execute()
        .await?
        .into_rows();

    let dropped: Vec<String> = day_ids.iter().skip(1).rev().take(1).cloned().collect();
    client
        .from(tables::DAYS)
        .delete()
        .filter_in("id", dropped.clone())
        .execute()
        .await?;

    let lookup = client
        .from(tables::DAYS)
        .select("*")
        .filter_eq("id", dropped.first().cloned().unwrap_or_default())
        .single()
        .execute()
        .await?;

    let cover_path = format!("{trip_id}/cover.jpg");
    let covers = client.storage().from("trip-covers");
    covers.upload(&cover_path, b"demo cover".to_vec()).await?;
    let cover_url = covers.get_public_url(&cover_path);
    client
        .from(tables::TRIPS)
        .update(row! { "cover_image_url": (cover_url.clone()) })
        .filter_eq("id", trip_id.clone())
        .execute()
        .await?;

    let remaining_days = client.store().row_count(tables::DAYS)?;

    match format {
        OutputFormat::Json => {
            let summary = json!({
                "user": session.user,
                "trip": trip,
                "schedule": schedule,
                "comments": comments,
                "deleted_days": dropped,
                "remaining_days": remaining_days,
                "deleted_day_lookup": lookup,
                "cover_url": cover_url,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            println!("{} Signed in as {}", "✓".green().bold(), session.user.email.bold());
            println!(
                "{} Created trip {} ({})",
                "✓".green().bold(),
                trip.str_field("name").unwrap_or_default().bold(),
                trip_id.dimmed()
            );
            println!("\n{} (day 1)", "Schedule".yellow().bold());
            for activity in &schedule {
                println!(
                    "  {}  {}  [{}]",
                    activity.str_field("start_time").unwrap_or_default().cyan(),
                    activity.str_field("title").unwrap_or_default(),
                    activity.str_field("status").unwrap_or_default()
                );
            }
            println!("\n{}", "Comments".yellow().bold());
            for comment in &comments {
                let author = comment
                    .get("profiles")
                    .and_then(|p| p.get("email"))
                    .and_then(|e| e.as_str())
                    .unwrap_or("unknown");
                println!(
                    "  {}: {}",
                    author.blue(),
                    comment.str_field("comment").unwrap_or_default()
                );
            }
            println!(
                "\n{} Removed {} day(s), {} left",
                "✓".green().bold(),
                dropped.len(),
                remaining_days
            );
            if let Some(error) = &lookup.error {
                println!("  Lookup of removed day: {}", error.to_string().red());
            }
            println!("{} Cover: {}", "✓".green().bold(), cover_url.blue());
        }
    }
    Ok(())
}

fn cmd_whoami(client: &MockClient, format: &OutputFormat) -> anyhow::Result<()> {
    let session = client.auth().get_session()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
        OutputFormat::Text => match session {
            Some(session) => {
                println!("{} ({})", session.user.email.bold(), session.user.id.dimmed());
                println!("  Role: {}", session.user.role.to_string().cyan());
                println!("  Token: {}", session.access_token.dimmed());
            }
            None => println!("Not signed in."),
        },
    }
    Ok(())
}

async fn cmd_sign_in(client: &MockClient, args: SignInArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let session = match (args.anonymous, args.email) {
        (true, _) => client.auth().sign_in_anonymously().await?,
        (false, Some(email)) => client.auth().sign_in_with_password(&email, &args.password).await?,
        (false, None) => return Err(anyhow!("--email or --anonymous is required")),
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
        OutputFormat::Text => println!(
            "{} Signed in as {} ({})",
            "✓".green().bold(),
            session.user.email.bold(),
            session.user.id.dimmed()
        ),
    }
    Ok(())
}

async fn cmd_sign_out(client: &MockClient) -> anyhow::Result<()> {
    client.auth().sign_out().await?;
    println!("{} Signed out.", "✓".green().bold());
    Ok(())
}
