//! # slack-history-export
//!
//! A CLI tool that downloads the complete conversation history of a [Slack](https://slack.com)
//! workspace — every public channel, private channel and direct message your user
//! participates in — to local JSON files.
//!
//! ## What it does
//!
//! For each conversation the tool pages backward through the Slack history API until
//! the full history has been retrieved, then writes one JSON file per calendar day
//! (UTC). When a channel was renamed at some point, files already written under the
//! old name are moved so the whole history ends up under the current name.
//!
//! This user-centric export covers conversations the official workspace exporter
//! leaves out: Slack's own export only includes public channels, while your token
//! sees everything your user is a member of. Full-history retrieval requires a plan
//! with unlimited history. Exporting your own private channels and direct messages
//! through the API is explicitly supported by Slack.
//!
//! ## Output layout
//!
//! ```text
//! <target-dir>/
//!   users.json
//!   channels.json
//!   channel/<name>/<YYYY-MM-DD>.json
//!   private_channels/<name>/<YYYY-MM-DD>.json
//!   direct_message/<user-name>/<YYYY-MM-DD>.json
//! ```
//!
//! `users.json` and `channels.json` are snapshot dumps, overwritten on every run.
//! Day files are also overwritten wholesale — each run re-fetches full history
//! rather than syncing incrementally, so do not run two exports against the same
//! target directory at once.
//!
//! ## Usage
//!
//! ```sh
//! # Export everything
//! slack-history-export ~/backups/slack --token xoxp-123-...
//!
//! # Channels only, listing conversations first
//! slack-history-export --dry-run --token xoxp-123-...
//! slack-history-export --skip-direct-messages --skip-private-channels --token xoxp-123-...
//! ```
//!
//! Preferences can be persisted in `~/.config/slack-history-export/config.toml`.
