use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toast_notifier::app::Config;
use toast_notifier::platform::{FileShortcutStore, MemoryPlatform, Platform, ToastHandle};
use toast_notifier::session::{Activation, ChannelHandler, DismissalReason, ToastEvent};
use toast_notifier::{AudioOption, Layout, NotificationService, TemplateModel, TextField};

/// Show a desktop toast notification and report how it ended
#[derive(Parser)]
#[command(name = "toast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Text of the notification
    #[arg(long)]
    text: Vec<String>,

    /// Attribution text shown under the notification
    #[arg(long)]
    attribute: Option<String>,

    /// Add an action button (repeatable)
    #[arg(long = "action")]
    actions: Vec<String>,

    /// App user model id
    #[arg(long, visible_alias = "appid")]
    aumi: Option<String>,

    /// Application name
    #[arg(long)]
    appname: Option<String>,

    /// Expiration time in seconds (0 uses the configured default)
    #[arg(long)]
    expires: Option<u64>,

    /// Absolute path of the image
    #[arg(long)]
    image: Option<PathBuf>,

    /// Only create or repair the app shortcut
    #[arg(long)]
    only_create_shortcut: bool,

    /// Audio state: 0 = default, 1 = silent, 2 = loop
    #[arg(long, default_value_t = 0)]
    audio_state: u8,

    /// Directory the app shortcut is written to
    #[arg(long)]
    shortcut_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the compiled notification document
    #[arg(long)]
    print_xml: bool,

    /// Seconds to wait for an outcome
    #[arg(long)]
    wait: Option<u64>,

    /// Deliver an outcome through the in-process transport
    /// (click, action:N, dismiss, hide, timeout, dismiss:CODE, fail)
    #[arg(long)]
    simulate: Option<Simulation>,

    /// Report the outcome as JSON
    #[arg(long)]
    json: bool,
}

/// Process exit codes
#[derive(Debug, Clone, Copy)]
enum Results {
    ToastClicked = 0,
    ToastDismissed = 1,
    ToastTimeOut = 2,
    ToastHided = 3,
    ToastNotActivated = 4,
    ToastFailed = 5,
    SystemNotSupported = 6,
    UnhandledOption = 7,
    MultipleTextNotSupported = 8,
    InitializationFailure = 9,
    ToastNotLaunched = 10,
}

impl From<Results> for ExitCode {
    fn from(result: Results) -> Self {
        ExitCode::from(result as u8)
    }
}

/// Exit code of an activated action button
const ACTION_EXIT_BASE: u8 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simulation {
    Activate(Option<String>),
    Dismiss(i32),
    Fail,
}

impl FromStr for Simulation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(Simulation::Activate(None)),
            "dismiss" => Ok(Simulation::Dismiss(0)),
            "hide" => Ok(Simulation::Dismiss(1)),
            "timeout" => Ok(Simulation::Dismiss(2)),
            "fail" => Ok(Simulation::Fail),
            _ => {
                if let Some(arguments) = s.strip_prefix("action:") {
                    Ok(Simulation::Activate(Some(arguments.to_string())))
                } else if let Some(code) = s.strip_prefix("dismiss:") {
                    code.parse()
                        .map(Simulation::Dismiss)
                        .map_err(|_| format!("invalid dismissal code: {}", code))
                } else {
                    Err(format!("unknown outcome: {}", s))
                }
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    if std::env::args_os().len() == 1 {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                Results::UnhandledOption.into()
            } else {
                ExitCode::SUCCESS
            };
            e.print()?;
            return Ok(code);
        }
    };

    // 設定を先に読み込む（ファイルがなければ作成）
    let config = Config::load().unwrap_or_default();
    // ログ初期化
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(&level)?;

    run(cli, config)
}

fn init_logging(level: &str) -> Result<()> {
    let log_dir = directories::ProjectDirs::from("", "", "toast-notifier")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("toast-notifier"));

    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("toast-notifier.log"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(log_file))
        .init();

    info!("Toast notifier starting");
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let platform = Arc::new(MemoryPlatform::new(FileShortcutStore::new()));
    if !platform.is_compatible() {
        eprintln!("Error, your system is not supported!");
        return Ok(Results::SystemNotSupported.into());
    }

    let mut service = NotificationService::from_config(platform.clone(), &config);
    if let Some(dir) = &cli.shortcut_dir {
        service.set_shortcut_dir(dir.clone());
    }

    if cli.only_create_shortcut {
        if cli.image.is_some() || !cli.text.is_empty() || !cli.actions.is_empty() || cli.expires.is_some() {
            eprintln!("--only-create-shortcut does not accept images/text/actions/expiration");
            return Ok(Results::InitializationFailure.into());
        }
        service.configure(
            cli.appname.unwrap_or(config.app_name),
            cli.aumi.unwrap_or(config.aumi),
        );
        return match service.create_or_repair_shortcut() {
            Ok(result) => {
                println!("Shortcut {}: {}", result, service.identity().shortcut_path().display());
                let code = match result.code() {
                    0 => 0,
                    code => (i32::from(ACTION_EXIT_BASE) + code) as u8,
                };
                Ok(ExitCode::from(code))
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                Ok(Results::InitializationFailure.into())
            }
        };
    }

    if cli.text.len() > 1 {
        eprintln!("Multiple texts are not supported");
        return Ok(Results::MultipleTextNotSupported.into());
    }
    let Some(audio_option) = AudioOption::from_code(cli.audio_state) else {
        eprintln!("Audio state not recognized: {}", cli.audio_state);
        return Ok(Results::UnhandledOption.into());
    };

    let text = cli.text.into_iter().next().unwrap_or_else(|| {
        let text = "Very Important Reminder".to_string();
        println!("Text not specified, using: {}", text);
        text
    });
    let attribute = cli.attribute.unwrap_or_else(|| {
        let attribute = "Don't worry, be happy!".to_string();
        println!("Attribute not specified, using: {}", attribute);
        attribute
    });
    let app_name = cli.appname.unwrap_or_else(|| {
        println!("AppName not specified, using: {}", config.app_name);
        config.app_name.clone()
    });
    let aumi = cli.aumi.unwrap_or_else(|| {
        println!("App User Model ID (AUMI) not specified, using: {}", config.aumi);
        config.aumi.clone()
    });
    let expiration = expiration_or_default(cli.expires, &config);

    service.configure(app_name, aumi);
    if let Err(e) = service.initialize() {
        eprintln!("Error, your system is not compatible! ({})", e);
        return Ok(Results::InitializationFailure.into());
    }

    let layout = if cli.image.is_some() {
        Layout::ImageAndText02
    } else {
        Layout::Text02
    };
    let mut model = TemplateModel::new(layout);
    model.set_text_field(text, TextField::FirstLine)?;
    model.set_audio_option(audio_option);
    model.set_attribution_text(attribute);
    for action in cli.actions {
        model.add_action(action);
    }
    model.set_expiration(expiration);
    if let Some(image) = cli.image {
        model.set_image_path(image)?;
    }

    if cli.print_xml {
        println!("{}", service.compile(&model)?);
    }

    let (handler, mut rx) = ChannelHandler::channel();
    let id = match service.show(&model, Arc::new(handler)) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Could not launch your toast notification! ({})", e);
            return Ok(Results::ToastNotLaunched.into());
        }
    };
    println!("Toast notification successfully sent!");

    if let (Some(simulation), Some(handle)) = (cli.simulate, service.session().handle(id)) {
        deliver(platform, handle, simulation);
    }

    let wait = cli.wait.map(Duration::from_secs).unwrap_or_else(|| config.wait());
    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(async { tokio::time::timeout(wait, rx.recv()).await });

    let code = match outcome {
        Ok(Some(event)) => report(&event, cli.json)?,
        _ => {
            warn!("No outcome received for toast {} within {:?}", id, wait);
            println!("No outcome received within {} seconds", wait.as_secs());
            Results::ToastTimeOut.into()
        }
    };
    service.clear_all();
    Ok(code)
}

/// `--expires`; missing or 0 falls back to the configured expiration
fn expiration_or_default(expires: Option<u64>, config: &Config) -> Duration {
    match expires {
        Some(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            println!("Expiration not specified, using: {} seconds", config.expiration_secs);
            config.expiration()
        }
    }
}

/// Deliver the outcome from another thread, the way a native transport would
fn deliver(platform: Arc<MemoryPlatform>, handle: ToastHandle, simulation: Simulation) {
    std::thread::spawn(move || {
        let delivered = match simulation {
            Simulation::Activate(arguments) => platform.activate(handle, arguments.as_deref()),
            Simulation::Dismiss(code) => platform.dismiss(handle, code),
            Simulation::Fail => platform.fail(handle),
        };
        if !delivered {
            warn!("Simulated outcome for {} was not delivered", handle);
        }
    });
}

fn report(event: &ToastEvent, json: bool) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    }

    let code = match event {
        ToastEvent::Activated {
            activation: Activation::Body,
        } => {
            println!("Toast activated: the user clicked in this toast");
            Results::ToastClicked.into()
        }
        ToastEvent::Activated {
            activation: Activation::Action(index),
        } => {
            println!("Toast activated: the user clicked on action #{}", index);
            let offset = u8::try_from(*index).unwrap_or(u8::MAX);
            ExitCode::from(ACTION_EXIT_BASE.saturating_add(offset))
        }
        ToastEvent::Dismissed { reason } => match reason {
            DismissalReason::UserCanceled => {
                println!("Toast dismissed by the user");
                Results::ToastDismissed.into()
            }
            DismissalReason::TimedOut => {
                println!("Toast timed out");
                Results::ToastTimeOut.into()
            }
            DismissalReason::ApplicationHidden => {
                println!("Toast was hidden by the application");
                Results::ToastHided.into()
            }
            DismissalReason::Unknown => {
                println!("Toast not activated");
                Results::ToastNotActivated.into()
            }
        },
        ToastEvent::Failed => {
            println!("Error showing current toast");
            Results::ToastFailed.into()
        }
    };
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_parsing() {
        assert_eq!("click".parse(), Ok(Simulation::Activate(None)));
        assert_eq!(
            "action:2".parse(),
            Ok(Simulation::Activate(Some("2".to_string())))
        );
        assert_eq!("timeout".parse(), Ok(Simulation::Dismiss(2)));
        assert_eq!("dismiss:9".parse(), Ok(Simulation::Dismiss(9)));
        assert_eq!("fail".parse(), Ok(Simulation::Fail));
        assert!("dismiss:x".parse::<Simulation>().is_err());
        assert!("explode".parse::<Simulation>().is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "toast", "--text", "hi", "--action", "Yes", "--action", "No", "--appid", "Demo.ID",
            "--audio-state", "2",
        ])
        .unwrap();
        assert_eq!(cli.text, vec!["hi"]);
        assert_eq!(cli.actions, vec!["Yes", "No"]);
        assert_eq!(cli.aumi.as_deref(), Some("Demo.ID"));
        assert_eq!(cli.audio_state, 2);
    }

    #[test]
    fn test_zero_expiration_uses_default() {
        let config = Config {
            expiration_secs: 45,
            ..Config::default()
        };
        assert_eq!(expiration_or_default(Some(0), &config), Duration::from_secs(45));
        assert_eq!(expiration_or_default(None, &config), Duration::from_secs(45));
        assert_eq!(expiration_or_default(Some(5), &config), Duration::from_secs(5));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Results::ToastFailed as u8, 5);
        assert_eq!(Results::InitializationFailure as u8, 9);
        assert_eq!(Results::ToastNotLaunched as u8, 10);
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert!(Cli::try_parse_from(["toast", "--bogus"]).is_err());
    }
}
