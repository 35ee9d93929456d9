use crate::client::{Channel, DirectMessage, SlackClient};
use crate::fetcher::{DEFAULT_PAGE_SIZE, fetch_history};
use crate::message::ConversationKind;
use crate::partition::partition_messages;
use crate::utils::{ExportConfig, write_pretty_json};
use eyre::{Context, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A conversation resolved to the directory its archive lives under.
struct Conversation {
    id: String,
    dir: String,
}

/// The main entry point for the export logic: authenticate, snapshot
/// users and channels, then fetch and partition every conversation class
/// that is not skipped.
pub fn execute(config: ExportConfig) -> Result<()> {
    let client = SlackClient::new(&config.token).wrap_err("Failed to build HTTP client")?;

    let auth = client.auth_test().wrap_err("Authentication check failed")?;
    if !config.quiet {
        eprintln!(
            "Successfully authenticated for team {} and user {}",
            auth.team, auth.user
        );
    }

    let users = client.list_users().wrap_err("Failed to list users")?;
    let user_names: HashMap<&str, &str> = users
        .iter()
        .map(|u| (u.id.as_str(), u.name.as_str()))
        .collect();
    if !config.quiet {
        eprintln!("Found {} users", users.len());
    }

    let channels = client.list_channels().wrap_err("Failed to list channels")?;
    let groups = client
        .list_private_channels()
        .wrap_err("Failed to list private channels")?;

    if !config.dry_run {
        write_pretty_json(&config.target_dir.join("users.json"), &users)
            .wrap_err("Failed to write users.json")?;
        // One merged snapshot: public channels first, then private.
        let merged: Vec<&Channel> = channels.iter().chain(groups.iter()).collect();
        write_pretty_json(&config.target_dir.join("channels.json"), &merged)
            .wrap_err("Failed to write channels.json")?;
    }

    let mut errors = 0usize;

    if !config.skip_channels {
        if !config.quiet {
            eprintln!();
            eprintln!("Found channels:");
            for channel in &channels {
                eprintln!("  {}", channel.name);
            }
        }
        errors += archive_class(
            &client,
            &config,
            ConversationKind::Channel,
            channel_conversations(&channels),
        )?;
    }

    if !config.skip_private_channels {
        if !config.quiet {
            eprintln!();
            eprintln!("Found private channels:");
            for group in &groups {
                let members = group.members.as_ref().map(Vec::len).unwrap_or(0);
                eprintln!("  {}: ({} members)", group.name, members);
            }
        }
        errors += archive_class(
            &client,
            &config,
            ConversationKind::PrivateChannel,
            channel_conversations(&groups),
        )?;
    }

    if !config.skip_direct_messages {
        let dms = client
            .list_direct_messages()
            .wrap_err("Failed to list direct messages")?;
        if !config.quiet {
            eprintln!();
            eprintln!("Found direct messages (1:1) with the following users:");
            for dm in &dms {
                eprintln!("  {}", dm_directory(dm, &user_names));
            }
        }
        let conversations = dms
            .iter()
            .map(|dm| Conversation {
                id: dm.id.clone(),
                dir: dm_directory(dm, &user_names),
            })
            .collect();
        errors += archive_class(&client, &config, ConversationKind::DirectMessage, conversations)?;
    }

    if !config.quiet {
        if errors > 0 {
            eprintln!("Done. Completed with {} error(s).", errors);
        } else {
            eprintln!("Done.");
        }
    }
    if errors > 0 {
        return Err(eyre!("{} conversation(s) failed to archive", errors));
    }
    Ok(())
}

fn channel_conversations(channels: &[Channel]) -> Vec<Conversation> {
    channels
        .iter()
        .map(|c| Conversation {
            id: c.id.clone(),
            dir: c.name.clone(),
        })
        .collect()
}

/// Direct messages are archived under the peer's user name; ids that the
/// user listing did not cover stay visible rather than vanishing.
fn dm_directory(dm: &DirectMessage, user_names: &HashMap<&str, &str>) -> String {
    match user_names.get(dm.user.as_str()) {
        Some(name) => (*name).to_string(),
        None => format!("{} (name unknown)", dm.user),
    }
}

/// Archive every conversation of one class, continuing past individual
/// failures. Returns the number of conversations that failed.
fn archive_class(
    client: &SlackClient,
    config: &ExportConfig,
    kind: ConversationKind,
    conversations: Vec<Conversation>,
) -> Result<usize> {
    if config.dry_run {
        return Ok(0);
    }

    let parent = config.target_dir.join(kind.parent_dir());
    fs::create_dir_all(&parent)
        .wrap_err_with(|| format!("Failed to create directory: {}", parent.display()))?;

    let pb = if config.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(conversations.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("=>-"),
        );
        bar
    };

    let mut errors = 0usize;
    for conversation in &conversations {
        pb.set_message(conversation.dir.clone());
        match archive_one(client, kind, &parent, conversation) {
            Ok(()) => {
                if config.verbose {
                    pb.println(format!("Archived: {}", conversation.dir));
                }
            }
            Err(e) => {
                errors += 1;
                pb.println(format!("Error [{}]: {:#}", conversation.dir, e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(errors)
}

fn archive_one(
    client: &SlackClient,
    kind: ConversationKind,
    parent: &Path,
    conversation: &Conversation,
) -> Result<()> {
    let dir = parent.join(&conversation.dir);
    fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("Failed to create directory: {}", dir.display()))?;

    let source = client.history(kind);
    let messages = fetch_history(&source, &conversation.id, DEFAULT_PAGE_SIZE)
        .wrap_err_with(|| format!("Failed to fetch history for {}", conversation.dir))?;
    partition_messages(parent, &conversation.dir, messages, kind)
        .wrap_err_with(|| format!("Failed to write archive for {}", conversation.dir))?;
    Ok(())
}
