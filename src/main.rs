use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quiz_results::engine::pick::{RandomPick, SeededPicker, ThreadRngPicker};
use quiz_results::engine::resolve::resolve_for_survey;
use quiz_results::engine::score::{compute_score, format_percent};
use quiz_results::error::Error;
use quiz_results::render::helpers::{read_text, write_string};
use quiz_results::render::report::render_report;
use quiz_results::results::generate::generate_tag_results;
use quiz_results::settings::{load_settings, Settings};
use quiz_results::store::answers::{save_result_or_log, AnswerPatch, AnswerStore};
use quiz_results::survey::format::{format_answer, format_survey};
use quiz_results::survey::types::{Answer, Survey, WarningItem};
use quiz_results::survey::validate::{check_answer_bounds, validate_survey};

#[derive(Parser, Debug)]
#[command(name = "quiz-results", version, about = "Resolve personalized survey results")]
struct Cli {
    /// Settings file, created with defaults when missing.
    #[arg(long, env = "QUIZ_RESULTS_SETTINGS", default_value = "quiz-results.json")]
    settings: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and report the result for one respondent.
    Resolve {
        #[arg(long)]
        survey: PathBuf,
        #[arg(long)]
        answers: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        no_persist: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the dragger score for one respondent.
    Score {
        #[arg(long)]
        survey: PathBuf,
        #[arg(long)]
        answers: PathBuf,
    },
    /// Print one result skeleton per combination of the selected tag labels.
    GenerateResults {
        #[arg(long)]
        survey: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print how many respondents reached each result.
    Stats {
        #[arg(long)]
        survey_id: String,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let settings = load_settings(&cli.settings)?;
    match cli.command {
        Command::Resolve {
            survey,
            answers,
            seed,
            no_persist,
            out,
        } => resolve(&settings, &survey, &answers, seed, !no_persist, out.as_deref()),
        Command::Score { survey, answers } => {
            let survey = load_survey(&survey)?;
            let answer = format_answer(&read_text(&answers)?)?;
            log_warnings(&check_answer_bounds(&survey.quizzes, &answer.answers));
            let score = compute_score(&survey.quizzes, &answer.answers);
            println!("{} / {} ({})", score.score, score.total, format_percent(&score));
            Ok(())
        }
        Command::GenerateResults { survey, out } => {
            let survey = load_survey(&survey)?;
            let results =
                generate_tag_results(&survey.tag_categories, &survey.results.selected_tags);
            info!(count = results.len(), "generated result skeletons");
            emit(&serde_json::to_string_pretty(&results)?, out.as_deref())
        }
        Command::Stats { survey_id } => {
            let store = AnswerStore::open(Path::new(&settings.database_path))?;
            for row in store.result_distribution(&survey_id)? {
                println!("{}\t{}", row.result_id, row.count);
            }
            Ok(())
        }
    }
}

fn resolve(
    settings: &Settings,
    survey_path: &Path,
    answers_path: &Path,
    seed: Option<u64>,
    persist: bool,
    out: Option<&Path>,
) -> Result<(), Error> {
    let survey = load_survey(survey_path)?;
    let answer = format_answer(&read_text(answers_path)?)?;
    log_warnings(&check_answer_bounds(&survey.quizzes, &answer.answers));

    let mut picker: Box<dyn RandomPick> = match seed.or(settings.seed) {
        Some(seed) => Box::new(SeededPicker::new(seed)),
        None => Box::new(ThreadRngPicker),
    };
    let resolution = resolve_for_survey(&survey, &answer.answers, picker.as_mut());
    let report = render_report(&survey, &resolution)?;
    emit(&report, out)?;

    if persist && settings.persist_results {
        if let Some(result_id) = &resolution.result_id {
            let store = AnswerStore::open(Path::new(&settings.database_path))?;
            let answer_id = stored_answer_id(&store, &survey, &answer)?;
            save_result_or_log(&store, &survey.id, &answer_id, result_id);
        }
    }
    Ok(())
}

/// Reuses the stored answer when its id is known, otherwise starts a new one with these answers.
fn stored_answer_id(store: &AnswerStore, survey: &Survey, answer: &Answer) -> Result<String, Error> {
    if !answer.id.is_empty() && store.get_answer(&survey.id, &answer.id)?.is_some() {
        return Ok(answer.id.clone());
    }
    let created = store.create_answer(&survey.id)?;
    let patch = AnswerPatch {
        answers: answer.answers.clone(),
        result_id: None,
    };
    store.put_answer(&survey.id, &created.id, &patch)?;
    info!(answer = %created.id, "stored new answer");
    Ok(created.id)
}

fn load_survey(path: &Path) -> Result<Survey, Error> {
    let survey = format_survey(&read_text(path)?)?;
    log_warnings(&validate_survey(&survey));
    Ok(survey)
}

fn log_warnings(warnings: &[WarningItem]) {
    for w in warnings {
        warn!(code = %w.code, "{}", w.message);
    }
}

fn emit(content: &str, out: Option<&Path>) -> Result<(), Error> {
    match out {
        Some(path) => write_string(path, content),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}
