//*** START FILE: src/main.rs ***//
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use waffley_drill::config::{load_config_or_default, Config, DEFAULT_CONFIG_FILE};
use waffley_drill::profile_io::{JsonFileStore, JsonStatsStore, ProgressStore};
use waffley_drill::progression::phase::Phase;
use waffley_drill::progression::round::{RoundTimer, SystemTimer};
use waffley_drill::progression::state::MercyChoice;
use waffley_drill::progression::timing::time_limit_for_level;
use waffley_drill::session::{Milestone, RoundView, SessionStatus};
use waffley_drill::speech::{LogSpeaker, SilentSpeaker, Speaker};
use waffley_drill::stats::StatsSink;
use waffley_drill::{Answer, Category, GameSession, SubmitOutcome, VocabularyRegistry};

#[derive(Parser, Debug)]
#[command(name = "waffley_drill", version, about = "Vocabulary drills from colours to spoken words", long_about = None)]
struct Cli {
    /// Path to config.toml
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Language code (es, fr, de, it, cy, pt). Defaults to the config's default_language.
    #[arg(short, long, global = true)]
    language: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a game in one category
    Play {
        #[arg(short, long, default_value = "colours")]
        category: Category,
    },
    /// Show phase, level and cycle for every category of a language
    Status,
    /// Show lifetime statistics
    Stats,
    /// Clear progress for one language, or everything with --all
    Reset {
        #[arg(long)]
        all: bool,
    },
    /// Move to the start of a phase within the current cycle
    Jump {
        #[arg(short, long, default_value = "colours")]
        category: Category,
        #[arg(value_enum)]
        phase: PhaseArg,
    },
    /// List the available languages
    Languages,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PhaseArg {
    Learning,
    Practice,
    Typing,
    Speech,
}

impl From<PhaseArg> for Phase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Learning => Phase::Learning,
            PhaseArg::Practice => Phase::Practice,
            PhaseArg::Typing => Phase::Typing,
            PhaseArg::Speech => Phase::Speech,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Spoken words go through the log, so keep the speech module audible by default.
    let env = env_logger::Env::default().default_filter_or("warn,waffley_drill::speech=info");
    env_logger::Builder::from_env(env).init();
    let cli = Cli::parse();

    let config = load_config_or_default(&cli.config)?;
    let mut registry = VocabularyRegistry::builtin()?;
    if let Some(dir) = &config.vocabulary_dir {
        registry.load_language_dir(dir)?;
    }
    let language = cli.language.clone().unwrap_or_else(|| config.default_language.clone());

    match cli.command {
        Commands::Play { category } => play(&config, &registry, &language, category),
        Commands::Status => status(&config, &registry, &language),
        Commands::Stats => show_stats(&config),
        Commands::Reset { all } => reset(&config, &language, all),
        Commands::Jump { category, phase } => jump(&config, &registry, &language, category, phase.into()),
        Commands::Languages => {
            for code in registry.language_codes() {
                let pack = registry.language(code)?;
                println!("{}  {} ({})", code, pack.name, pack.speech_locale);
            }
            Ok(())
        }
    }
}

fn status(config: &Config, registry: &VocabularyRegistry, language: &str) -> Result<(), Box<dyn Error>> {
    let pack = registry.language(language)?;
    let store = JsonFileStore::in_dir(&config.data_dir);
    println!("{} progress", pack.name);
    for category in Category::ALL {
        let progress = store.load(language, category);
        let seconds = time_limit_for_level(progress.levels_completed, 0, &config.rules, &config.timing) / 1000;
        println!(
            "  {:<10} cycle {}  {:<8} level {:>2}/{}  {}s per answer  {} correct",
            category.label(),
            progress.current_cycle,
            progress.phase(&config.rules),
            progress.level_in_phase(&config.rules),
            config.rules.levels_per_phase,
            seconds,
            progress.total_correct_answers
        );
    }
    println!("Correct answers across all languages: {}", store.total_correct_all());
    Ok(())
}

fn show_stats(config: &Config) -> Result<(), Box<dyn Error>> {
    let stats = JsonStatsStore::in_dir(&config.data_dir);
    let stats = stats.statistics();
    println!("Games played:  {}", stats.games_played);
    println!("Best streak:   {}", stats.best_streak);
    println!("Highest cycle: {}", stats.highest_cycle);
    for (language, entry) in &stats.language_stats {
        println!(
            "  {}: {} games, {} correct, {:.1} per game",
            language,
            entry.games,
            entry.correct,
            entry.average_score()
        );
    }
    Ok(())
}

fn reset(config: &Config, language: &str, all: bool) -> Result<(), Box<dyn Error>> {
    let mut store = JsonFileStore::in_dir(&config.data_dir);
    if all {
        store.reset_all()?;
        JsonStatsStore::in_dir(&config.data_dir).reset()?;
        println!("All progress and statistics cleared.");
    } else {
        store.reset_language(language)?;
        println!("Progress for '{}' cleared.", language);
    }
    Ok(())
}

fn jump(
    config: &Config,
    registry: &VocabularyRegistry,
    language: &str,
    category: Category,
    phase: Phase,
) -> Result<(), Box<dyn Error>> {
    registry.view(language, category)?;
    let mut store = JsonFileStore::in_dir(&config.data_dir);
    let progress = store.load(language, category).jump_to_phase(phase, &config.rules);
    store.save(language, category, &progress)?;
    println!(
        "{} {} now starts at {} (cycle {}).",
        language,
        category.label(),
        phase,
        progress.current_cycle
    );
    Ok(())
}

fn play(
    config: &Config,
    registry: &VocabularyRegistry,
    language: &str,
    category: Category,
) -> Result<(), Box<dyn Error>> {
    let view = registry.view(language, category)?;
    let store = JsonFileStore::in_dir(&config.data_dir);
    let mut stats = JsonStatsStore::in_dir(&config.data_dir);
    let speaker: Box<dyn Speaker> = if config.audio_enabled {
        Box::new(LogSpeaker)
    } else {
        Box::new(SilentSpeaker)
    };
    let mut session = GameSession::new(
        view,
        store,
        SystemTimer::new(),
        rand::thread_rng(),
        config.rules.clone(),
        config.timing.clone(),
    )?
    .with_speaker(speaker);

    println!(
        "{} {}: answer with the button number, or type/say the word. ':p' pauses, ':q' quits.",
        view.pack.name,
        category.label()
    );
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        match session.status() {
            SessionStatus::AwaitingQuestion => {
                let round = session.next_round()?;
                print_round(&round);
            }
            SessionStatus::MercyOffered => {
                print!("[r]etry, [a]dd time, or [e]nd? ");
                io::stdout().flush()?;
                match lines.next().transpose()?.as_deref().map(str::trim) {
                    Some("r") => session.accept_mercy(MercyChoice::Retry)?,
                    Some("a") => session.accept_mercy(MercyChoice::AddTime)?,
                    _ => session.decline_mercy(),
                }
                continue;
            }
            SessionStatus::Paused => {
                print!("Paused. Press Enter to resume. ");
                io::stdout().flush()?;
                if lines.next().transpose()?.is_none() {
                    break;
                }
                session.resume();
                println!("{:.1}s left", session.timer().remaining_ms() as f64 / 1000.0);
                continue;
            }
            SessionStatus::Over | SessionStatus::Finished => break,
            SessionStatus::InRound => {}
        }

        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else { break };
        let input = line.trim();

        // The timer may have run out while we were blocked on input.
        if let Some(outcome) = session.poll_timer()? {
            report(&outcome);
            continue;
        }
        let answer = match input {
            ":q" => break,
            ":p" => {
                session.pause();
                continue;
            }
            _ if session.state().phase(&config.rules).is_typing() => Answer::Typed(input),
            _ if session.state().phase(&config.rules) == Phase::Speech => Answer::Spoken(input),
            _ => match input.parse::<usize>() {
                Ok(n) if n >= 1 => Answer::Button(n - 1),
                _ => {
                    println!("Enter a button number.");
                    continue;
                }
            },
        };
        let outcome = session.submit(answer)?;
        report(&outcome);
    }

    let summary = session.finish(&mut stats)?;
    println!();
    println!(
        "Score: {}   Accuracy: {}%   Average: {:.1}s",
        summary.score, summary.accuracy_percent, summary.average_response_seconds
    );
    if summary.is_new_best {
        println!("New personal best! Previous best: {}", summary.previous_best);
    } else if stats.statistics().best_streak > 0 {
        println!("Your best: {}", stats.statistics().best_streak);
    }
    println!("{}", summary.message);
    info!("Session saved at level {}", summary.progress.levels_completed);
    Ok(())
}

fn print_round(round: &RoundView) {
    println!();
    println!(
        "[{} | level {} | cycle {} | {}/{} mastered | {}s]",
        round.phase,
        round.level_in_cycle,
        round.cycle,
        round.mastery.mastered,
        round.mastery.total,
        round.time_limit_ms / 1000
    );
    match (&round.picture, &round.swatch) {
        (Some(picture), _) => println!("  {}", picture),
        (None, Some(swatch)) => println!("  colour {}", swatch),
        (None, None) => {}
    }
    println!("{}", round.prompt);
    if let Some(hint) = &round.hint {
        println!("  ({})", hint);
    }
    for (i, button) in round.buttons.iter().enumerate() {
        println!("  {}. {}", i + 1, button.label);
    }
    if !round.accents.is_empty() {
        println!("  accents: {}", round.accents.join(" "));
    }
}

fn report(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Ignored => {}
        SubmitOutcome::Unrecognised { heard } => println!("Heard: \"{}\"", heard),
        SubmitOutcome::Correct { score, milestone } => {
            println!("Correct! Streak {}", score);
            match milestone {
                Some(Milestone::LevelUp { title, level_in_cycle, phase_intro, items_note, time_note, .. }) => {
                    println!("*** {} You reached level {} ***", title, level_in_cycle);
                    if let Some(intro) = phase_intro {
                        println!("{}", intro);
                    }
                    println!("{}  {}", items_note, time_note);
                }
                Some(Milestone::CycleComplete { completed_cycle, unlock_note, .. }) => {
                    println!("*** You finished cycle {}! ***", completed_cycle);
                    println!("{}", unlock_note);
                }
                None => {}
            }
        }
        SubmitOutcome::Wrong { expected, mercy } | SubmitOutcome::TimedOut { expected, mercy } => {
            if matches!(outcome, SubmitOutcome::TimedOut { .. }) {
                println!("Time's up! It was {}", expected);
            } else {
                println!("Not quite. It was {}", expected);
            }
            if let Some(message) = mercy {
                println!("{}", message);
            }
        }
    }
}

//*** END FILE: src/main.rs ***//
