//! Command-line front end for the German tutor.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run) and apply
//!    command-line overrides.
//! 3. Sign in: token identity when `--token` is given, anonymous otherwise.
//! 4. Open the document store named by the config and bind the vocabulary
//!    collection to the learner's partition.
//! 5. Build the inference client and the content pipeline.
//! 6. Run the requested subcommand.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use german_tutor::{
    config::{AppConfig, AppPaths, StoreBackend},
    llm::{GeminiClient, InferenceBackend, ProficiencyLevel, Speaker, Utterance},
    pipeline::{ContentPipeline, PipelineError, ToolOutput, ToolRequest, ToolSlot, ToolState},
    review::Rating,
    store::{
        export_json, import_collection, level_progress, now_ms, DocumentStore,
        FileDocumentStore, Identity, LocalCache, MemoryDocumentStore, StoreError,
        VocabularyEntry, VocabularyStore, EXPORT_FILE_NAME,
    },
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "german-tutor", version, about = "AI-assisted German vocabulary trainer")]
struct Cli {
    /// Sign-in token naming the learner's partition.  Anonymous when absent.
    #[arg(long, env = "GERMAN_TUTOR_TOKEN", global = true)]
    token: Option<String>,

    /// Proficiency level for this run (A1..C2).
    #[arg(long, global = true)]
    level: Option<ProficiencyLevel>,

    /// Settings file to use instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API key for the inference service.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a word and add it to the collection.
    Analyze { word: String },
    /// Split a compound word into its parts.
    Deconstruct { word: String },
    /// Correct a piece of writing.
    Correct {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Rewrite a text at the current level.
    Simplify {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Quick lookup of one word from a text.
    Gloss { token: String },
    /// Generate and store a starter deck for a topic.
    Deck { topic: String },
    /// Show a popular idiom.
    Idiom,
    /// Roleplay conversation with a persona.
    Chat {
        #[arg(default_value = "Barista")]
        persona: String,
    },
    /// Arrange shuffled words into a sentence.
    Sentence,
    /// Write down a spoken sentence.
    Dictation,
    /// Guess the article of a noun.
    Quiz,
    /// Review the words that are due.
    Review,
    /// Go through the whole collection in random order.
    Flashcards,
    /// List the collection, optionally filtered.
    List {
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Delete an entry by id.
    Delete { id: String },
    /// Export the collection as JSON.
    Export { path: Option<PathBuf> },
    /// Replace the collection with a JSON export.
    Import { path: PathBuf },
    /// Synthesize speech for a text into a WAV file.
    Speak {
        text: String,
        #[arg(long, short, default_value = "speech.wav")]
        out: PathBuf,
    },
    /// Show experience, level and due count.
    Stats,
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_entry(entry: &VocabularyEntry) {
    let gender = entry.gender.as_deref().map(|g| format!("{g} ")).unwrap_or_default();
    println!("{gender}{}", entry.word);
    if let Some(ipa) = &entry.ipa {
        println!("  [{ipa}]");
    }
    if let Some(translation) = &entry.translation {
        println!("  {translation}");
    }
    if let Some(definition) = &entry.definition {
        println!("  {definition}");
    }
    if let Some(grammar) = &entry.grammar {
        if let Some(plural) = &grammar.plural {
            println!("  plural: {plural}");
        }
        for (case, [singular, plural]) in &grammar.declension {
            println!("  {case}: {singular} / {plural}");
        }
        for (tense, forms) in &grammar.conjugation {
            println!("  {tense}: {}", forms.join(", "));
        }
    }
    if let Some(example) = &entry.example_sentence {
        println!("  \"{}\" ({})", example.text, example.translation);
    }
}

fn print_output(output: &ToolOutput) {
    match output {
        ToolOutput::Analysis(analysis) => {
            if let Some(original) = &analysis.corrected_from {
                println!("(corrected from \"{original}\")");
            }
            print_entry(&analysis.entry);
        }
        ToolOutput::Deconstruction(result) => {
            for part in &result.parts {
                let kind = part.kind.as_deref().unwrap_or("part");
                println!("{} = {} ({kind})", part.german, part.english);
            }
            println!("→ {}", result.meaning);
        }
        ToolOutput::Simplified(text) => println!("{text}"),
        ToolOutput::Gloss(gloss) => {
            let gender = gloss.gender.as_deref().map(|g| format!("{g} ")).unwrap_or_default();
            println!("{gender}{}: {}", gloss.word, gloss.translation);
        }
        ToolOutput::Correction(result) => {
            println!("{}", result.corrected);
            for error in &result.errors {
                println!("  {} → {}: {}", error.original, error.correction, error.explanation);
            }
        }
        ToolOutput::Idiom(idiom) => {
            println!("{}", idiom.phrase);
            println!("  literally: {}", idiom.literal);
            println!("  meaning:   {}", idiom.meaning);
            if !idiom.context.is_empty() {
                println!("  usage:     {}", idiom.context);
            }
        }
        ToolOutput::Deck(entries) => {
            println!("added {} words", entries.len());
            for entry in entries {
                let translation = entry.translation.as_deref().unwrap_or("");
                println!("  {} - {translation}", entry.word);
            }
        }
        ToolOutput::SentenceGame(builder) => println!("{}", builder.translation()),
        ToolOutput::Dictation(sentence) => println!("{}", sentence.text),
        ToolOutput::GenderQuiz(card) => println!("___ {}", card.word),
    }
}

/// Run one content tool through a [`ToolSlot`] and print the outcome.
async fn run_tool(
    pipeline: &ContentPipeline,
    request: ToolRequest,
    level: ProficiencyLevel,
) -> Result<()> {
    let mut slot = ToolSlot::new();
    let ticket = slot.begin();
    let result = pipeline.run(request, level).await;
    slot.complete(ticket, result);

    match slot.state() {
        ToolState::Ready(output) => {
            print_output(output);
            Ok(())
        }
        ToolState::Failed(message) => bail!("{message}"),
        ToolState::Idle | ToolState::Loading => Ok(()),
    }
}

/// Next stdin line, trimmed.  `None` on end of input.
async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

async fn play(speaker: &Speaker, text: &str, out: &std::path::Path) -> Result<()> {
    match speaker.speak(text).await {
        Utterance::Generated(asset) => {
            asset
                .write_to(out)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("audio: {} ({:.1}s)", out.display(), asset.duration_secs());
        }
        Utterance::LocalVoice { voice, .. } => {
            println!("(speech synthesis unavailable; use the {voice} system voice)");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Interactive tools
// ---------------------------------------------------------------------------

async fn chat(pipeline: &ContentPipeline, persona: &str, level: ProficiencyLevel) -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut conversation = pipeline.start_roleplay(persona);
    if let Some(greeting) = conversation.messages().last() {
        println!("{persona}: {}", greeting.text);
    }

    println!("(empty line to leave)");
    while let Some(line) = read_line(&mut stdin).await? {
        if line.is_empty() {
            break;
        }
        match pipeline.roleplay_turn(&mut conversation, &line, level).await {
            Ok(reply) => {
                println!("{persona}: {}", reply.spoken);
                if let Some(correction) = reply.correction {
                    println!("  [{correction}]");
                }
            }
            Err(e) => {
                log::warn!("roleplay turn failed: {e}");
                println!("{}", e.user_message());
            }
        }
    }
    Ok(())
}

async fn sentence(pipeline: &ContentPipeline, level: ProficiencyLevel) -> Result<()> {
    let mut builder = pipeline.sentence_game(level).await?;
    let shown = builder.pool().to_vec();
    println!("{}", builder.translation());
    for (i, word) in shown.iter().enumerate() {
        println!("  {i}: {word}");
    }
    println!("word numbers in order:");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let answer = read_line(&mut stdin).await?.unwrap_or_default();
    for index in answer.split_whitespace() {
        let Some(word) = index.parse::<usize>().ok().and_then(|i| shown.get(i)) else {
            bail!("not a word number: {index}");
        };
        if let Some(pos) = builder.pool().iter().position(|w| w == word) {
            builder.pick(pos);
        }
    }

    if pipeline.submit_sentence(&builder).await? {
        println!("Richtig!");
    } else {
        println!("Not quite: {}", builder.sentence());
    }
    Ok(())
}

async fn dictation(
    pipeline: &ContentPipeline,
    speaker: &Speaker,
    paths: &AppPaths,
    level: ProficiencyLevel,
) -> Result<()> {
    let target = pipeline.dictation(level).await?;
    play(speaker, &target.text, &paths.data_dir.join("dictation.wav")).await?;
    println!("write what you hear:");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let attempt = read_line(&mut stdin).await?.unwrap_or_default();
    let outcome = pipeline.submit_dictation(&target.text, &attempt, level).await?;
    if outcome.correct {
        println!("Richtig!");
    } else {
        println!("Correct: {}", target.text);
        if let Some(feedback) = outcome.feedback {
            println!("{feedback}");
        }
    }
    Ok(())
}

async fn quiz(pipeline: &ContentPipeline, level: ProficiencyLevel) -> Result<()> {
    let card = pipeline.gender_quiz(level).await?;
    println!("der, die or das?  ___ {}", card.word);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let guess = read_line(&mut stdin).await?.unwrap_or_default();
    if pipeline.submit_gender(&card, &guess).await? {
        println!("Richtig!");
    } else {
        println!("Falsch: {} {}", card.gender, card.word);
    }
    Ok(())
}

async fn review(pipeline: &ContentPipeline) -> Result<()> {
    let mut session = pipeline.start_review(now_ms());
    if session.is_finished() {
        println!("nothing due");
        return Ok(());
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(entry) = session.current().cloned() {
        println!("\n{}  ({} left; enter to reveal)", entry.word, session.remaining());
        if read_line(&mut stdin).await?.is_none() {
            break;
        }
        session.reveal();
        print_entry(&entry);

        let rating = loop {
            println!("rate: hard / good / easy");
            let Some(line) = read_line(&mut stdin).await? else {
                break None;
            };
            match line.parse::<Rating>() {
                Ok(rating) => break Some(rating),
                Err(e) => println!("{e}"),
            }
        };
        let Some(rating) = rating else {
            break;
        };
        match pipeline.rate_review(&mut session, rating, now_ms()).await {
            Ok(_) => {}
            Err(PipelineError::Store(StoreError::NotFound(id))) => {
                log::warn!("entry {id} was deleted during the review");
                println!("(that word was deleted meanwhile)");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let earned = pipeline.finish_review(&session).await?;
    println!("reviewed {} words, +{earned} xp", session.reviewed());
    Ok(())
}

async fn flashcards(store: &VocabularyStore) -> Result<()> {
    let cards = store.snapshot().shuffled(&mut rand::thread_rng());
    if cards.is_empty() {
        println!("no words yet");
        return Ok(());
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    for (i, card) in cards.iter().enumerate() {
        println!("\n{}  ({}/{}; enter to flip, q to stop)", card.word, i + 1, cards.len());
        match read_line(&mut stdin).await? {
            Some(line) if line.eq_ignore_ascii_case("q") => break,
            Some(_) => print_entry(card),
            None => break,
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let paths = AppPaths::new();

    // 2. Configuration
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };
    if let Some(key) = cli.api_key.filter(|k| !k.trim().is_empty()) {
        config.inference.api_key = Some(key);
    }
    let level = cli.level.unwrap_or(config.learner.level);

    // 3. Identity
    let identity = Identity::sign_in(cli.token.as_deref(), &paths.identity_file)?;

    // 4. Store
    let documents: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryDocumentStore::new()),
        StoreBackend::File => {
            let path = config.store.resolved_path(&paths);
            log::debug!("document store: {}", path.display());
            Arc::new(FileDocumentStore::open(path).await?)
        }
    };
    let store = Arc::new(VocabularyStore::open(documents, &identity).await?);

    // 5. Inference + pipeline
    let backend: Arc<dyn InferenceBackend> =
        Arc::new(GeminiClient::from_config(&config.inference));
    let speaker = Speaker::new(Arc::clone(&backend), config.learner.local_voice.clone());
    let pipeline = ContentPipeline::from_config(backend, Arc::clone(&store), &config.learner);

    // 6. Command
    match cli.command {
        Command::Analyze { word } => run_tool(&pipeline, ToolRequest::Analyze(word), level).await?,
        Command::Deconstruct { word } => {
            run_tool(&pipeline, ToolRequest::Deconstruct(word), level).await?
        }
        Command::Correct { text } => {
            run_tool(&pipeline, ToolRequest::Correct(text.join(" ")), level).await?
        }
        Command::Simplify { text } => {
            run_tool(&pipeline, ToolRequest::Simplify(text.join(" ")), level).await?
        }
        Command::Gloss { token } => run_tool(&pipeline, ToolRequest::Gloss(token), level).await?,
        Command::Deck { topic } => run_tool(&pipeline, ToolRequest::Deck(topic), level).await?,
        Command::Idiom => run_tool(&pipeline, ToolRequest::Idiom, level).await?,
        Command::Chat { persona } => chat(&pipeline, &persona, level).await?,
        Command::Sentence => sentence(&pipeline, level).await?,
        Command::Dictation => dictation(&pipeline, &speaker, &paths, level).await?,
        Command::Quiz => quiz(&pipeline, level).await?,
        Command::Review => review(&pipeline).await?,
        Command::Flashcards => flashcards(&store).await?,
        Command::List { search } => {
            let snapshot = store.snapshot();
            let entries = match search.as_deref() {
                Some(query) => snapshot.search(query),
                None => snapshot.sorted_by_word(),
            };
            for entry in &entries {
                let translation = entry.translation.as_deref().unwrap_or("");
                println!("{}  {}  {translation}", entry.id, entry.word);
            }
            println!("{} entries", entries.len());
        }
        Command::Delete { id } => {
            store.delete(&id).await?;
            println!("deleted {id}");
        }
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
            let entries = store.snapshot().entries;
            std::fs::write(&path, export_json(&entries)?)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("exported {} entries to {}", entries.len(), path.display());
        }
        Command::Import { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let cache = LocalCache::new(&paths.local_cache_file);
            let entries = import_collection(&text, &store, &cache).await?;
            println!("imported {} entries", entries.len());
        }
        Command::Speak { text, out } => play(&speaker, &text, &out).await?,
        Command::Stats => {
            let snapshot = store.snapshot();
            println!("identity: {}", identity.uid());
            println!("words:    {}", snapshot.entries.len());
            println!("due:      {}", snapshot.due_count(now_ms()));
            println!(
                "xp:       {} (level {}, {}/100)",
                snapshot.experience,
                snapshot.level(),
                level_progress(snapshot.experience)
            );
        }
    }

    Ok(())
}
