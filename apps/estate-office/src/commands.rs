//! Command execution. Results are printed to stdout as JSON.

use std::sync::Arc;

use anyhow::{Context, bail};
use backoffice::{BackofficeModule, CollectionStore};
use backoffice_sdk::{CallRequest, OutgoingMessage, RecordId, Resource, filters_from_pairs};
use estate_kit::{Notifier, TracingNotifier};
use role_resolver::RoleResolverModule;
use role_resolver_sdk::{DenyTarget, GuardView, Role, RoleView, SessionIdentity};
use serde::Serialize;
use serde_json::{Value, json};
use static_role_plugin::{StaticIdentityProvider, StaticRolePlugin};
use tracing::{info, warn};

use crate::cli::{Cli, CollectionAction, Command, IdentityArgs, MessageAction};
use crate::config::AppConfig;

/// # Errors
///
/// Any configuration, lookup or backend failure of the command.
pub async fn run(cli: Cli, cfg: &AppConfig) -> anyhow::Result<()> {
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let offline = cli.offline_roles;

    match cli.command {
        Command::Whoami(identity) => whoami(cfg, offline, identity).await,
        Command::Check {
            identity,
            path,
            allowed,
            retries,
        } => check(cfg, offline, identity, &path, allowed, retries).await,
        Command::Properties { action } => {
            let module = backoffice(cfg, notifier)?;
            collection(&module.properties, action).await
        }
        Command::Clients { action } => {
            let module = backoffice(cfg, notifier)?;
            collection(&module.clients, action).await
        }
        Command::Sales { action } => {
            let module = backoffice(cfg, notifier)?;
            collection(&module.sales, action).await
        }
        Command::SaleDetails { id } => {
            let module = backoffice(cfg, notifier)?;
            let details = module.sale_details.details(&RecordId::new(id)).await?;
            print_json(&json!({
                "payments": details.payments,
                "documents": details.documents,
                "paid_total": details.paid_total(),
            }))
        }
        Command::Dashboard { ticks } => {
            let module = backoffice(cfg, notifier)?;
            dashboard(&module, ticks).await
        }
        Command::Message {
            action:
                MessageAction::Send {
                    to,
                    channel,
                    subject,
                    body,
                    client_id,
                },
        } => {
            let module = backoffice(cfg, notifier)?;
            let message = OutgoingMessage {
                to,
                channel: channel.into(),
                subject,
                body,
                client_id,
            };
            print_json(&module.messaging.send_message(&message).await?)
        }
        Command::Call { to, client_id } => {
            let module = backoffice(cfg, notifier)?;
            let call = CallRequest { to, client_id };
            print_json(&module.messaging.initiate_call(&call).await?)
        }
    }
}

struct Roles {
    module: RoleResolverModule,
    identity: Arc<StaticIdentityProvider>,
}

/// Role resolver over the backend, or over the static plugin when offline.
/// The identity is `--user`, falling back to `static_roles.signed_in`.
fn roles(cfg: &AppConfig, offline: bool, identity: IdentityArgs) -> anyhow::Result<Roles> {
    let Some(user) = identity.user.or_else(|| cfg.static_roles.signed_in.clone()) else {
        bail!("no signed-in identity: pass --user or set static_roles.signed_in");
    };

    if offline {
        let plugin = StaticRolePlugin::init(&cfg.static_roles);
        plugin.identity.sign_in(user);
        let module = RoleResolverModule::with_source(cfg.roles.clone(), plugin.service)?;
        return Ok(Roles {
            module,
            identity: plugin.identity,
        });
    }

    Ok(Roles {
        module: RoleResolverModule::init(cfg.roles.clone(), &cfg.backend)?,
        identity: Arc::new(StaticIdentityProvider::new(SessionIdentity::signed_in(user))),
    })
}

async fn whoami(cfg: &AppConfig, offline: bool, identity: IdentityArgs) -> anyhow::Result<()> {
    let roles = roles(cfg, offline, identity)?;
    let tracker = roles.module.track(roles.identity.as_ref());
    let mut handle = tracker.handle();

    let state = handle.settled().await;
    let menu = roles.module.menu(&state);
    print_json(&json!({
        "user": handle.identity().resolvable_id(),
        "role": RoleView::from(&state),
        "menu": menu,
    }))
}

async fn check(
    cfg: &AppConfig,
    offline: bool,
    identity: IdentityArgs,
    path: &str,
    allowed: Vec<Role>,
    retries: u32,
) -> anyhow::Result<()> {
    let roles = roles(cfg, offline, identity)?;
    let tracker = roles.module.track(roles.identity.as_ref());
    let mut route = if allowed.is_empty() {
        roles.module.guard_path(tracker.handle(), path)
    } else {
        roles.module.guard(tracker.handle(), path, allowed)
    };

    let mut view = route.settle().await;
    let mut attempt = 0;
    while matches!(view, GuardView::Error { .. }) && attempt < retries {
        attempt += 1;
        warn!(attempt, "role lookup failed, retrying");
        route.retry();
        view = route.settle().await;
    }

    info!(role = ?tracker.view().role, "route check finished");
    print_json(&guard_json(path, &view))
}

fn guard_json(path: &str, view: &GuardView) -> Value {
    match view {
        GuardView::Loading => json!({ "path": path, "outcome": "loading" }),
        GuardView::Error { message } => {
            json!({ "path": path, "outcome": "error", "message": message })
        }
        GuardView::Redirect { to, target } => json!({
            "path": path,
            "outcome": "redirect",
            "to": to,
            "target": match target {
                DenyTarget::AccessDenied => "access_denied",
                DenyTarget::Home => "home",
            },
        }),
        GuardView::Render => json!({ "path": path, "outcome": "render" }),
    }
}

fn backoffice(cfg: &AppConfig, notifier: Arc<dyn Notifier>) -> anyhow::Result<BackofficeModule> {
    BackofficeModule::init(cfg.backoffice.clone(), &cfg.backend, notifier)
}

async fn collection<T: Resource>(
    store: &CollectionStore<T>,
    action: CollectionAction,
) -> anyhow::Result<()> {
    match action {
        CollectionAction::List => store.fetch().await?,
        CollectionAction::Search { filters } => {
            let filters =
                filters_from_pairs(filters.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            store.search(&filters).await?;
        }
        CollectionAction::Delete { id } => {
            let id = RecordId::new(id);
            store.delete(&id).await?;
            return print_json(&json!({ "deleted": id.as_str(), "collection": T::COLLECTION }));
        }
    }

    let snapshot = store.snapshot();
    print_json(&json!({
        "collection": T::COLLECTION,
        "items": snapshot.data,
        "stats": snapshot.stats,
    }))
}

async fn dashboard(module: &BackofficeModule, ticks: u32) -> anyhow::Result<()> {
    let poller = module.start_dashboard();
    let mut updates = poller.subscribe();

    for _ in 0..ticks {
        updates
            .changed()
            .await
            .context("dashboard poller stopped")?;
        print_json(poller.snapshot().as_ref())?;
    }
    poller.stop();
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
