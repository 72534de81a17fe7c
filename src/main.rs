use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use owlerlite_lib::commands::{chat, lineage, scopes, settings, status, CommandError};
use owlerlite_lib::render;
use owlerlite_lib::session::Session;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a question to query the selected scopes.
  /scopes                     reload and list scopes
  /toggle <scope-id>          select or deselect a scope
  /new <name> [pattern...]    create a scope
  /delete <scope-id>          delete a scope
  /track <scope-id> <url>     track a page in a scope
  /history                    show the conversation
  /used <msg> <result>        mark a result as used
  /lineage <msg> <result>     show how a result's chunk changed
  /stats                      backend statistics
  /health                     probe the backend
  /settings                   show settings
  /set <key> <value>          change one setting
  /export                     print scopes and settings as JSON
  /import <file>              merge settings from an export
  /reset                      clear conversation and selection
  /quit";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let app_dir = std::env::var_os("OWLERLITE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(owlerlite_lib::default_app_dir);
    let session = owlerlite_lib::bootstrap(&app_dir).context("Failed to open settings store")?;

    let connectivity = status::refresh(&session).await;
    println!(
        "Backend {} ({:?}). Type /help for commands.",
        session.client().base_url(),
        connectivity
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        match dispatch(&session, line).await {
            Ok(output) => println!("{output}"),
            Err(e) => println!("error: {e}"),
        }
    }
    session.close();
    Ok(())
}

fn index_pair(args: &[&str]) -> Result<(usize, usize)> {
    let message = args
        .first()
        .context("missing message number")?
        .parse()
        .context("message number must be an integer")?;
    let result = args
        .get(1)
        .context("missing result number")?
        .parse()
        .context("result number must be an integer")?;
    Ok((message, result))
}

async fn dispatch(session: &Session, line: &str) -> Result<String> {
    let now = Utc::now();
    let Some(command) = line.strip_prefix('/') else {
        return match chat::send_query(session, line).await {
            Ok(outcome) => Ok(render::outcome(&outcome, &session.settings(), now)),
            Err(e @ CommandError::Validation(_)) => Ok(e.to_string()),
            Err(e) => Err(e.into()),
        };
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();
    let output = match name {
        "help" => HELP.to_string(),
        "scopes" => {
            if let Err(e) = scopes::load_scopes(session).await {
                println!("showing cached scopes: {e}");
            }
            let registry = session.scopes();
            render::scopes(registry.scopes(), |id| registry.is_selected(id))
        }
        "toggle" => {
            let id = args.first().context("usage: /toggle <scope-id>")?;
            if scopes::toggle_scope(session, id) {
                format!("selected {id}")
            } else {
                format!("deselected {id}")
            }
        }
        "new" => {
            let name = args.first().context("usage: /new <name> [pattern...]")?;
            let form = scopes::ScopeForm {
                name: (*name).to_string(),
                patterns: args[1..].join("\n"),
                ..Default::default()
            };
            format!("created scope {}", scopes::create_scope(session, form).await?)
        }
        "delete" => {
            let id = args.first().context("usage: /delete <scope-id>")?;
            scopes::delete_scope(session, id).await?;
            format!("deleted {id}")
        }
        "track" => {
            let (Some(scope_id), Some(url)) = (args.first(), args.get(1)) else {
                anyhow::bail!("usage: /track <scope-id> <url>");
            };
            scopes::track_page(session, scope_id, url).await?;
            format!("tracking {url}")
        }
        "history" => render::conversation(&chat::get_messages(session), &session.settings(), now),
        "used" => {
            let (message, result) = index_pair(&args)?;
            chat::mark_result_used(session, message, result, None)?;
            "Thanks! Learned your preference.".to_string()
        }
        "lineage" => {
            let (message, result) = index_pair(&args)?;
            let view = lineage::open_result_lineage(session, message, result).await?;
            render::lineage(&view)
        }
        "stats" => render::stats(&status::load_stats(session).await, now),
        "health" => format!("{:?}", status::check_health(session).await),
        "settings" => serde_json::to_string_pretty(&settings::get_settings(session))?,
        "set" => {
            let (Some(key), Some(raw)) = (args.first(), args.get(1)) else {
                anyhow::bail!("usage: /set <key> <value>");
            };
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String((*raw).to_string()));
            let mut patch = serde_json::Map::new();
            patch.insert((*key).to_string(), value);
            settings::update_settings(session, &Value::Object(patch))?;
            format!("updated {key}")
        }
        "export" => serde_json::to_string_pretty(&settings::export_data(session))?,
        "import" => {
            let path = args.first().context("usage: /import <file>")?;
            let document = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {path}"))?;
            settings::import_data(session, &document)?;
            "Data imported successfully".to_string()
        }
        "reset" => {
            chat::reset_conversation(session);
            "conversation cleared".to_string()
        }
        other => format!("unknown command /{other}, try /help"),
    };
    Ok(output)
}
