use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use outcall::dialog::DialogController;
use outcall::voice::{
    AudioCapture, AudioPlayback, MicSpeechInput, SpeechToText, SpokenOutput, TextToSpeech,
    rms_energy,
};
use outcall::{ChatGenerator, Config};

/// outcall - voice gateway for automated outbound screening calls
#[derive(Parser)]
#[command(name = "outcall", version, about)]
struct Cli {
    /// Path to config file (defaults to ~/.config/omni/outcall/config.toml)
    #[arg(short, long, env = "OUTCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Skip the interactive confirmation before the call starts
    #[arg(short, long)]
    yes: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "नमस्ते! यह एक test है।")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,outcall=info",
        1 => "info,outcall=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, &text).await,
        };
    }

    run_call(&cli, config).await
}

/// Run one screening call end to end
#[allow(clippy::future_not_send)]
async fn run_call(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let call_id = uuid::Uuid::new_v4();
    tracing::info!(%call_id, model = %config.llm.model, "starting outcall");

    // Audio self-check: synthesis and playback must work before dialing in
    let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;
    let mut playback = AudioPlayback::new()?;

    println!("testing audio...");
    let check = tts.synthesize(&config.script.self_check_phrase).await?;
    playback
        .play_mp3(&check)
        .await
        .map_err(|e| anyhow::anyhow!("audio self-check failed: {e}"))?;
    println!("audio ok");

    if !cli.yes {
        let start = dialoguer::Confirm::new()
            .with_prompt("start the call?")
            .default(true)
            .interact()?;
        if !start {
            println!("aborted");
            return Ok(());
        }
    }

    let stt = SpeechToText::from_config(&config.voice, &config.api_keys)?;
    let capture = AudioCapture::new()?;
    let input = MicSpeechInput::new(capture, stt);
    let output = SpokenOutput::new(tts, playback);
    let generator =
        ChatGenerator::new(config.llm.clone(), outcall::prompt::SYSTEM_PROMPT.to_string());

    // Ctrl-C feeds the cooperative interrupt checked between turns
    let (interrupt_tx, interrupt_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupt_tx.send(()).await;
        }
    });

    println!("\n{}", "=".repeat(60));
    println!("call started at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("say one of the end keywords to finish at any time");
    println!("{}", "=".repeat(60));

    let controller = DialogController::new(
        config.session,
        config.script,
        input,
        output,
        generator,
        interrupt_rx,
    );

    let report = controller.run().await;
    if !report.history.is_empty() {
        println!("\ntranscript:\n{}", report.history.format_transcript());
    }
    tracing::info!(
        %call_id,
        end = report.end.describe(),
        turns = report.turns.len(),
        utterances = report.history.len(),
        "call report"
    );

    Ok(())
}

/// Test microphone input with a level meter
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("testing microphone for {duration} seconds, speak now...");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.drain();
        let energy = rms_energy(&samples);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} [{meter}]", i + 1);
    }

    capture.stop();
    println!("\nif the meter moved, your mic is working");
    Ok(())
}

/// Test speaker output with a sine tone
async fn test_speaker() -> anyhow::Result<()> {
    println!("you should hear a 440Hz tone for 2 seconds...");

    let mut playback = AudioPlayback::new()?;

    let sample_rate = 24000_u32;
    let num_samples = sample_rate as usize * 2;
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    playback.play(samples).await?;
    println!("done");
    Ok(())
}

/// Test TTS synthesis and playback
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("synthesizing: \"{text}\"");

    let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;
    let audio = tts.synthesize(text).await?;
    println!("got {} bytes of audio", audio.len());

    let mut playback = AudioPlayback::new()?;
    playback.play_mp3(&audio).await?;
    println!("done");
    Ok(())
}
