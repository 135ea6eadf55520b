// talkify - Turn web articles into narrated audio summaries

mod backends;
mod config;

use anyhow::{Context, Result};
use backends::{CommandSink, SayPlatform};
use clap::{Parser, Subcommand};
use config::TalkifyConfig;
use indicatif::{ProgressBar, ProgressStyle};
use speech_engine::{
    CloudFallbackPlayer, Language, Narrator, PlaybackController, PlaybackOutcome, Route,
    ServiceClient, SpeechPlatform, Translator, segment, summarize, wait_for_catalog,
};
use std::io::{self, IsTerminal, Read};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "talkify")]
#[command(about = "Turn web articles into narrated audio summaries", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize an article and narrate the summary
    Podcast {
        /// Article URL
        url: String,

        /// Narration language (en, ta, hi)
        #[arg(short, long)]
        language: Option<Language>,

        /// Narrate the full article instead of a summary
        #[arg(long)]
        full: bool,

        /// Sentence index to resume from
        #[arg(long, default_value_t = 0)]
        start_at: usize,

        /// Print the narration text without playing it
        #[arg(long)]
        print_only: bool,
    },

    /// Narrate text given as arguments or on stdin
    Speak {
        /// Narration language (en, ta, hi)
        #[arg(short, long)]
        language: Option<Language>,

        /// Sentence index to resume from
        #[arg(long, default_value_t = 0)]
        start_at: usize,

        /// Translate the text into the narration language first
        #[arg(short, long)]
        translate: bool,

        /// Text to narrate (reads stdin when omitted)
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// List local voices
    Voices {
        /// Only show voices for this language
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the backend service URL
    SetServiceUrl {
        /// Base URL (e.g., http://127.0.0.1:8000)
        url: String,
    },
    /// Set the default narration language
    SetLanguage {
        /// Language code (en, ta, hi)
        language: Language,
    },
    /// Set the local speaking rate
    SetRate {
        /// Rate in words per minute
        rate: u32,
    },
    /// Set the command used to play cloud audio
    SetPlayer {
        /// Player command line (e.g., "mpv --no-video")
        player: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Handle config subcommands
    if let Commands::Config { action } = &args.command {
        return handle_config_command(action);
    }

    // Load configuration
    let config = TalkifyConfig::load().context("Failed to load configuration")?;

    match args.command {
        Commands::Podcast {
            url,
            language,
            full,
            start_at,
            print_only,
        } => {
            let language = language.unwrap_or(config.language);
            run_podcast(&config, &url, language, full, start_at, print_only).await
        }
        Commands::Speak {
            language,
            start_at,
            translate,
            text,
        } => {
            let language = language.unwrap_or(config.language);
            run_speak(&config, text, language, start_at, translate).await
        }
        Commands::Voices { language } => list_voices(&config, language).await,
        Commands::Config { .. } => Ok(()),
    }
}

fn service_client(config: &TalkifyConfig) -> Result<Arc<ServiceClient>> {
    let client = ServiceClient::with_timeout(
        &config.service_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("Failed to create service client")?;
    Ok(Arc::new(client))
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid spinner template")?,
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

async fn run_podcast(
    config: &TalkifyConfig,
    url: &str,
    language: Language,
    full: bool,
    start_at: usize,
    print_only: bool,
) -> Result<()> {
    if url.trim().is_empty() {
        anyhow::bail!("Please enter a valid URL");
    }

    let client = service_client(config)?;
    let translator = Arc::new(Translator::for_service(Arc::clone(&client)));

    let pb = spinner("Extracting article...")?;
    let article = client.extract(url).await;
    pb.finish_and_clear();
    let article = article.context("Failed to extract article")?;

    eprintln!(
        "Article: \"{}\" (~{} words)",
        article.title,
        article.content.split_whitespace().count()
    );

    let text = if full {
        article.content
    } else {
        let pb = spinner("Summarizing...")?;
        let summary =
            summarize(&client, &article.content, language, config.summary_sentences).await;
        pb.finish_and_clear();
        summary
    };

    // The summarizer may ignore the requested language
    let text = if language.matches_script(&text) {
        text
    } else {
        let pb = spinner(&format!("Translating to {}...", language))?;
        let translated = translator.translate(&text, language).await;
        pb.finish_and_clear();
        translated
    };

    println!("{}", text);
    println!();

    if print_only {
        return Ok(());
    }

    narrate(config, client, translator, &text, language, start_at).await
}

async fn run_speak(
    config: &TalkifyConfig,
    words: Vec<String>,
    language: Language,
    start_at: usize,
    translate: bool,
) -> Result<()> {
    let text = if words.is_empty() && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read piped input")?;
        buffer
    } else {
        words.join(" ")
    };

    if text.trim().is_empty() {
        anyhow::bail!("No text provided");
    }

    let client = service_client(config)?;
    let translator = Arc::new(Translator::for_service(Arc::clone(&client)));

    let text = if translate {
        translator.translate(&text, language).await
    } else {
        text
    };

    narrate(config, client, translator, &text, language, start_at).await
}

async fn narrate(
    config: &TalkifyConfig,
    client: Arc<ServiceClient>,
    translator: Arc<Translator>,
    text: &str,
    language: Language,
    start_at: usize,
) -> Result<()> {
    if !SayPlatform::is_available() {
        log::warn!("say command not found, only cloud speech is available");
    }

    let platform = SayPlatform::spawn(Some(config.rate));
    let controller = PlaybackController::new(platform)
        .with_catalog_wait(Duration::from_millis(config.voice_wait_ms));
    let sink = Arc::new(CommandSink::new(&config.player).context("Failed to set up audio player")?);
    let cloud = CloudFallbackPlayer::new(client, sink).with_translator(translator);
    let narrator = Narrator::new(controller, cloud);

    let total = segment(text).len();
    let playback = narrator.narrate(text, language, start_at, move |next| {
        log::debug!("Finished sentence {}/{}", next, total);
    });
    tokio::pin!(playback);

    let result = tokio::select! {
        result = &mut playback => result,
        _ = tokio::signal::ctrl_c() => {
            let resume_at = narrator.pause();
            let _ = playback.await;
            eprintln!();
            eprintln!("Paused. Resume with: --start-at {}", resume_at);
            return Ok(());
        }
    };

    match result.context("Playback failed")? {
        (Route::Local, PlaybackOutcome::Completed) => eprintln!("Done."),
        (Route::Cloud, PlaybackOutcome::Completed) => eprintln!("Done (cloud speech)."),
        (_, PlaybackOutcome::Stopped { resume_at }) => {
            eprintln!("Stopped. Resume with: --start-at {}", resume_at)
        }
    }

    Ok(())
}

async fn list_voices(config: &TalkifyConfig, language: Option<Language>) -> Result<()> {
    if !SayPlatform::is_available() {
        anyhow::bail!("say command not found. Local voices require macOS.");
    }

    let platform = SayPlatform::spawn(Some(config.rate));
    let voices = wait_for_catalog(
        platform.as_ref(),
        Duration::from_millis(config.voice_wait_ms.max(3000)),
    )
    .await;

    let voices: Vec<_> = match language {
        Some(language) => voices
            .into_iter()
            .filter(|v| v.language_prefix() == language.code())
            .collect(),
        None => voices,
    };

    if voices.is_empty() {
        println!("No local voices found. Narration will use cloud speech.");
        return Ok(());
    }

    println!("Available voices for {} backend:", platform.name());
    println!();

    for voice in voices {
        println!("  {} ({})", voice.name, voice.locale);
    }

    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = TalkifyConfig::load()?;
            println!("Configuration file: {:?}", TalkifyConfig::config_path()?);
            println!();
            println!("service_url = \"{}\"", config.service_url);
            println!("language = \"{}\"", config.language.code());
            println!("rate = {}", config.rate);
            println!("player = \"{}\"", config.player);
            println!("voice_wait_ms = {}", config.voice_wait_ms);
            println!("request_timeout_secs = {}", config.request_timeout_secs);
            println!("summary_sentences = {}", config.summary_sentences);
        }
        ConfigAction::SetServiceUrl { url } => {
            let mut config = TalkifyConfig::load()?;
            config.service_url = url.trim_end_matches('/').to_string();
            config.save()?;
            println!("Service URL set to: {}", config.service_url);
        }
        ConfigAction::SetLanguage { language } => {
            let mut config = TalkifyConfig::load()?;
            config.language = *language;
            config.save()?;
            println!("Default language set to: {}", language);
        }
        ConfigAction::SetRate { rate } => {
            let mut config = TalkifyConfig::load()?;
            config.rate = *rate;
            config.save()?;
            println!("Default rate set to: {} WPM", rate);
        }
        ConfigAction::SetPlayer { player } => {
            CommandSink::new(player)?;
            let mut config = TalkifyConfig::load()?;
            config.player = player.clone();
            config.save()?;
            println!("Audio player set to: {}", player);
        }
    }
    Ok(())
}
