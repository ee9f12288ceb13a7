//! Command-line interface.

use std::path::PathBuf;

use backoffice_sdk::MessageChannel;
use clap::{Args, Parser, Subcommand, ValueEnum};
use role_resolver_sdk::Role;

#[derive(Debug, Parser)]
#[command(
    name = "estate-office",
    version,
    about = "Real-estate back-office client"
)]
pub struct Cli {
    /// YAML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Resolve roles from the `static_roles` config block instead of the
    /// backend.
    #[arg(long, global = true)]
    pub offline_roles: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the role of an identity and print it with its menu.
    Whoami(IdentityArgs),

    /// Run the route guard for a path.
    Check {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Client route, e.g. `/settings`.
        #[arg(long)]
        path: String,

        /// Roles allowed on the route. Without any, the allow-list comes from
        /// the `roles.routes` table.
        #[arg(long = "allow", value_parser = parse_role)]
        allowed: Vec<Role>,

        /// Retries after a failed role lookup.
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },

    Properties {
        #[command(subcommand)]
        action: CollectionAction,
    },

    Clients {
        #[command(subcommand)]
        action: CollectionAction,
    },

    Sales {
        #[command(subcommand)]
        action: CollectionAction,
    },

    /// Payments and documents of one sale.
    SaleDetails { id: String },

    /// Poll the dashboard and print one snapshot per applied refresh.
    Dashboard {
        #[arg(long, default_value_t = 1)]
        ticks: u32,
    },

    Message {
        #[command(subcommand)]
        action: MessageAction,
    },

    /// Start a phone call.
    Call {
        #[arg(long)]
        to: String,

        #[arg(long)]
        client_id: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct IdentityArgs {
    /// External user id of the signed-in identity.
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CollectionAction {
    List,

    /// Search with `key=value` filters; repeated keys become a list.
    Search {
        #[arg(value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },

    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum MessageAction {
    Send {
        #[arg(long)]
        to: String,

        #[arg(long, value_enum, default_value_t = Channel::Sms)]
        channel: Channel,

        #[arg(long)]
        subject: Option<String>,

        #[arg(long)]
        body: String,

        #[arg(long)]
        client_id: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Channel {
    Sms,
    Email,
    Whatsapp,
}

impl From<Channel> for MessageChannel {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Sms => Self::Sms,
            Channel::Email => Self::Email,
            Channel::Whatsapp => Self::Whatsapp,
        }
    }
}

fn parse_role(raw: &str) -> Result<Role, String> {
    match Role::from_backend(raw) {
        Role::Unknown => Err(format!("unknown role '{raw}', expected admin or employee")),
        role => Ok(role),
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing filter name in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
