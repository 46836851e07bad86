//! Command-line front end for the push client.
//!
//! Reads credentials from `Settings.ini`, then sends a push or queries
//! delivery status with the chosen protocol generation.

mod settings;

use std::fmt::Debug;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jpush_core::types::legacy::{PushMessage, PushMessageRequest, ReceiverType};
use jpush_core::types::v3::{AndroidNotification, Audience, IosNotification, JPushMessage, Notification, PlatformTarget};
use jpush_core::{JPushClient, Platforms, ProtocolAdapter, ProxySettings, PushDelivery, PushResponse};
use tracing::{info, warn};

use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "jpush-console")]
#[command(about = "Send pushes and query delivery status through the JPush gateway")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file, tried before ./Settings.ini and ../../Settings.ini
    #[arg(long, global = true, env = "JPUSH_SETTINGS")]
    settings: Option<PathBuf>,

    /// Protocol generation
    #[arg(long, global = true, value_enum, default_value_t = Protocol::V3)]
    protocol: Protocol,

    /// Talk to a mock gateway on http://localhost:<PORT> instead
    #[arg(long, global = true, value_name = "PORT")]
    local: Option<u16>,

    /// Use plain HTTP for the API host (legacy and v2 only)
    #[arg(long, global = true)]
    no_ssl: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Send a notification
    Push {
        /// Notification text
        content: String,

        /// Android title
        #[arg(short, long)]
        title: Option<String>,

        /// Who receives it
        #[arg(long, value_enum, default_value_t = Target::All)]
        to: Target,

        /// Tags, aliases or registration ids for --to
        receivers: Vec<String>,

        /// Also target iOS
        #[arg(long)]
        ios: bool,

        #[arg(long, value_enum, default_value_t = Mode::Sync)]
        mode: Mode,
    },

    /// Show delivery counts for message ids
    Status {
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(long, value_enum, default_value_t = Mode::Sync)]
        mode: Mode,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Protocol {
    Legacy,
    V2,
    V3,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    All,
    Tag,
    /// Devices carrying every tag (v2 and v3 only)
    TagAnd,
    Alias,
    RegistrationId,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Block until the gateway answers
    Sync,
    /// Await a background request
    Async,
    /// Fire and collect the outcome from a channel (push only)
    Queue,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jpush_console=info,jpush_core=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let (path, settings) = Settings::load(cli.settings.as_deref())?;
    info!(path = %path.display(), proxy = settings.proxy_url.is_some(), "settings loaded");

    match cli.protocol {
        Protocol::Legacy => {
            let client = configure(JPushClient::legacy(&settings.app_key, &settings.master_secret, !cli.no_ssl), &cli, &settings);
            dispatch(client, &cli.command, form_request)
        }
        Protocol::V2 => {
            let client = configure(JPushClient::v2(&settings.app_key, &settings.master_secret, !cli.no_ssl), &cli, &settings);
            dispatch(client, &cli.command, form_request)
        }
        Protocol::V3 => {
            if cli.no_ssl {
                warn!("--no-ssl is ignored for v3");
            }
            let client = configure(JPushClient::v3(&settings.app_key, &settings.master_secret), &cli, &settings);
            dispatch(client, &cli.command, v3_message)
        }
    }
}

fn configure<P: ProtocolAdapter>(mut client: JPushClient<P>, cli: &Cli, settings: &Settings) -> JPushClient<P> {
    if let Some(url) = &settings.proxy_url {
        client = client.with_proxy(ProxySettings::new(url.as_str()));
    }
    if let Some(port) = cli.local {
        info!(port, "using local gateway");
        client.override_api_url("http://localhost", port);
        client.override_report_url("http://localhost", port);
    }
    client
}

/// Arguments of the `push` subcommand.
struct PushArgs<'a> {
    content: &'a str,
    title: Option<&'a str>,
    to: Target,
    receivers: &'a [String],
    platforms: Platforms,
}

fn dispatch<P>(client: JPushClient<P>, command: &Command, build: fn(&PushArgs<'_>) -> P::Message) -> Result<()>
where
    P: ProtocolAdapter,
    P::Message: Debug,
{
    match command {
        Command::Push {
            content,
            title,
            to,
            receivers,
            ios,
            mode,
        } => {
            if *to != Target::All && receivers.is_empty() {
                bail!("--to requires at least one receiver");
            }
            let platforms = if *ios { Platforms::ANDROID_AND_IOS } else { Platforms::ANDROID };
            let message = build(&PushArgs {
                content,
                title: title.as_deref(),
                to: *to,
                receivers,
                platforms,
            });
            push(&client, message, *mode)
        }
        Command::Status { ids, mode } => status(&client, ids, *mode),
    }
}

fn push<P>(client: &JPushClient<P>, message: P::Message, mode: Mode) -> Result<()>
where
    P: ProtocolAdapter,
    P::Message: Debug,
{
    match mode {
        Mode::Sync => print_response(&client.send_push_message(&message)?),
        Mode::Async => {
            let runtime = runtime()?;
            let _guard = runtime.enter();
            let pending = client.send_push_message_async(&message)?;
            let response = runtime.block_on(pending).context("push failed")?;
            print_response(&response);
        }
        Mode::Queue => {
            let runtime = runtime()?;
            let _guard = runtime.enter();
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            client.queue_push_message(message, tx)?;
            match runtime.block_on(rx.recv()) {
                Some(PushDelivery::Sent { response, .. }) => print_response(&response),
                Some(PushDelivery::Failed { message, error }) => bail!("queued push failed: {error} ({message:?})"),
                None => bail!("queued push produced no outcome"),
            }
        }
    }
    Ok(())
}

fn status<P: ProtocolAdapter>(client: &JPushClient<P>, ids: &[String], mode: Mode) -> Result<()> {
    let statuses = match mode {
        Mode::Sync => client.query_push_message_status(ids)?,
        Mode::Async => {
            let runtime = runtime()?;
            let _guard = runtime.enter();
            let pending = client.query_push_message_status_async(ids)?;
            runtime.block_on(pending).context("status query failed")?
        }
        Mode::Queue => bail!("status queries cannot be queued"),
    };

    let Some(statuses) = statuses else {
        bail!("gateway returned no status data");
    };
    for status in statuses {
        println!(
            "Id: {}, Android: {}, iOS: {}",
            status.message_id,
            count(status.android_delivered_count),
            count(status.apple_push_notification_delivered_count),
        );
    }
    Ok(())
}

fn count(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |n| n.to_string())
}

fn print_response(response: &PushResponse) {
    if response.is_success() {
        println!(
            "sent: msg_id={} sendno={}",
            response.message_id.as_deref().unwrap_or_default(),
            response.send_identity.as_deref().unwrap_or_default()
        );
    } else {
        println!(
            "rejected: {} {}",
            response.code,
            response.message.as_deref().unwrap_or_default()
        );
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn form_request(args: &PushArgs<'_>) -> PushMessageRequest {
    let mut message = PushMessage::new(args.content);
    if let Some(title) = args.title {
        message = message.with_title(title);
    }
    let receiver_type = match args.to {
        Target::All => return PushMessageRequest::broadcast(args.platforms, message),
        Target::Tag => ReceiverType::Tag,
        Target::TagAnd => ReceiverType::TagAnd,
        Target::Alias => ReceiverType::Alias,
        Target::RegistrationId => ReceiverType::RegistrationId,
    };
    PushMessageRequest::new(receiver_type, Some(args.receivers.join(",")), args.platforms, message)
}

fn v3_message(args: &PushArgs<'_>) -> JPushMessage {
    let receivers = args.receivers.iter().cloned();
    let audience = match args.to {
        Target::All => Audience::All,
        Target::Tag => Audience::tags(receivers),
        Target::TagAnd => Audience::tags_and(receivers),
        Target::Alias => Audience::aliases(receivers),
        Target::RegistrationId => Audience::registration_ids(receivers),
    };
    let ios = args.platforms.contains(Platforms::IOS).then(|| IosNotification {
        badge: Some(1),
        ..IosNotification::default()
    });
    JPushMessage::new(PlatformTarget::from(args.platforms), audience).with_notification(Notification {
        alert: Some(args.content.to_string()),
        android: Some(AndroidNotification {
            title: args.title.map(str::to_string),
            ..AndroidNotification::default()
        }),
        ios,
        ..Notification::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(to: Target, receivers: &[String]) -> PushArgs<'_> {
        PushArgs {
            content: "hello",
            title: Some("hi"),
            to,
            receivers,
            platforms: Platforms::ANDROID,
        }
    }

    #[test]
    fn cli_parses_push_with_receivers() {
        let cli = Cli::try_parse_from([
            "jpush-console",
            "--protocol",
            "v2",
            "push",
            "hello",
            "--title",
            "hi",
            "--to",
            "registration-id",
            "040f2c4faa0",
        ])
        .unwrap();
        assert!(matches!(cli.protocol, Protocol::V2));
        match cli.command {
            Command::Push { receivers, to, mode, .. } => {
                assert_eq!(receivers, vec!["040f2c4faa0"]);
                assert!(to == Target::RegistrationId);
                assert!(mode == Mode::Sync);
            }
            Command::Status { .. } => panic!("expected push"),
        }
    }

    #[test]
    fn status_requires_ids() {
        assert!(Cli::try_parse_from(["jpush-console", "status"]).is_err());
    }

    #[test]
    fn broadcast_form_request_has_no_receiver() {
        let request = form_request(&args(Target::All, &[]));
        assert_eq!(request.receiver_type, ReceiverType::Broadcast);
        assert!(request.receiver_value.is_none());
        assert_eq!(request.message.title.as_deref(), Some("hi"));
    }

    #[test]
    fn tagged_form_request_joins_receivers() {
        let receivers = vec!["beijing".to_string(), "vip".to_string()];
        let request = form_request(&args(Target::Tag, &receivers));
        assert_eq!(request.receiver_type, ReceiverType::Tag);
        assert_eq!(request.receiver_value.as_deref(), Some("beijing,vip"));
    }

    #[test]
    fn tag_and_maps_to_intersection_for_both_generations() {
        let receivers = vec!["beijing".to_string(), "vip".to_string()];
        let request = form_request(&args(Target::TagAnd, &receivers));
        assert_eq!(request.receiver_type, ReceiverType::TagAnd);
        let message = v3_message(&args(Target::TagAnd, &receivers));
        assert_eq!(message.audience, Audience::tags_and(["beijing", "vip"]));
    }

    #[test]
    fn v3_message_targets_registration_ids() {
        let receivers = vec!["0606a164ac1".to_string()];
        let message = v3_message(&args(Target::RegistrationId, &receivers));
        assert_eq!(message.audience, Audience::registration_ids(["0606a164ac1"]));
        let notification = message.notification.unwrap();
        assert_eq!(notification.alert.as_deref(), Some("hello"));
        assert!(notification.ios.is_none());
    }
}
