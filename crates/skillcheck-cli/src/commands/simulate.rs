//! The `skillcheck simulate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde::de::DeserializeOwned;
use serde::Serialize;

use skillcheck_core::behaviour::{BehaviourEvent, BehaviourSession};
use skillcheck_core::error::{SessionError, SinkError};
use skillcheck_core::listening::{ListeningEvent, ListeningSession};
use skillcheck_core::model::TestKind;
use skillcheck_core::parser::{load_behaviour_set, load_listening_set};
use skillcheck_core::session::{Effect, SessionId};
use skillcheck_core::traits::{SinkReceipt, SubmissionSink};
use skillcheck_sink::log::LogSink;
use skillcheck_sink::{create_sink, load_config_from};

use crate::media::SimulatedMedia;
use crate::script::load_script;

pub struct SimulateArgs {
    pub test: TestKind,
    pub question_set: PathBuf,
    pub script: PathBuf,
    pub config: Option<PathBuf>,
    pub sink: Option<String>,
    pub dry_run: bool,
    pub max_plays: Option<u32>,
    pub user_id: Option<u64>,
    pub output: Option<PathBuf>,
}

/// A session that can be driven from a script.
trait ScriptedSession {
    type Event: DeserializeOwned + Serialize + std::fmt::Debug;

    fn id(&self) -> SessionId;
    fn apply(&mut self, event: Self::Event) -> Result<Effect, SessionError>;
    fn finish_submit(&mut self, result: Result<SinkReceipt, SinkError>)
        -> Result<(), SessionError>;
    fn summary(&self) -> Vec<(&'static str, String)>;
}

impl ScriptedSession for ListeningSession {
    type Event = ListeningEvent;

    fn id(&self) -> SessionId {
        ListeningSession::id(self)
    }

    fn apply(&mut self, event: ListeningEvent) -> Result<Effect, SessionError> {
        ListeningSession::apply(self, event)
    }

    fn finish_submit(
        &mut self,
        result: Result<SinkReceipt, SinkError>,
    ) -> Result<(), SessionError> {
        ListeningSession::finish_submit(self, result)
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        let playback = self.playback();
        vec![
            ("Phase", format!("{:?}", self.phase())),
            ("Plays remaining", playback.plays_remaining.to_string()),
            ("Heard once", playback.has_completed_once.to_string()),
            ("Furthest point", format!("{:.1}s", playback.max_time_reached)),
            ("Questions visible", self.questions_visible().to_string()),
            ("Limit reached", self.playback_limit_reached().to_string()),
            (
                "Answered",
                format!("{}/{}", self.answers().len(), self.questions().len()),
            ),
            ("Unanswered MCQ", self.unanswered_mcq().join(", ")),
            ("Error", self.submit_status().error.clone().unwrap_or_default()),
            (
                "Receipt",
                self.receipt()
                    .and_then(|r| r.message.clone())
                    .unwrap_or_default(),
            ),
        ]
    }
}

impl ScriptedSession for BehaviourSession {
    type Event = BehaviourEvent;

    fn id(&self) -> SessionId {
        BehaviourSession::id(self)
    }

    fn apply(&mut self, event: BehaviourEvent) -> Result<Effect, SessionError> {
        BehaviourSession::apply(self, event)
    }

    fn finish_submit(
        &mut self,
        result: Result<SinkReceipt, SinkError>,
    ) -> Result<(), SessionError> {
        BehaviourSession::finish_submit(self, result)
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Phase", format!("{:?}", self.phase())),
            ("Position", self.position_label()),
            ("Progress", format!("{}%", self.progress_percent())),
            (
                "Answered",
                format!("{}/{}", self.answered_count(), self.total_questions()),
            ),
            ("Submit enabled", self.submit_enabled().to_string()),
            ("Error", self.submit_status().error.clone().unwrap_or_default()),
            (
                "Receipt",
                self.receipt()
                    .and_then(|r| r.message.clone())
                    .unwrap_or_default(),
            ),
        ]
    }
}

/// One replayed step.
#[derive(Debug, Serialize)]
struct StepRecord {
    step: usize,
    event: serde_json::Value,
    outcome: String,
    ok: bool,
}

#[derive(Debug, Serialize)]
struct Transcript {
    session_id: SessionId,
    test: String,
    sink: String,
    created_at: String,
    steps: Vec<StepRecord>,
    final_state: Vec<(String, String)>,
}

pub async fn execute(args: SimulateArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let mut options = config.session_options();
    if let Some(max_plays) = args.max_plays {
        options.max_plays = max_plays;
    }
    if let Some(user_id) = args.user_id {
        options.user_id = user_id;
    }

    let (sink_name, sink): (String, Box<dyn SubmissionSink>) = if args.dry_run {
        ("dry-run".to_string(), Box::new(LogSink))
    } else {
        let (name, sink_config) = config.sink(args.sink.as_deref())?;
        (name.to_string(), create_sink(name, sink_config)?)
    };

    tracing::info!(
        test = %args.test,
        sink = %sink_name,
        max_plays = options.max_plays,
        user_id = options.user_id,
        "starting simulation"
    );

    let transcript = match args.test {
        TestKind::Listening => {
            let questions = load_listening_set(&args.question_set)?;
            let script = load_script::<ListeningEvent>(&args.script)?;
            let session = ListeningSession::new(questions, options);
            run(session, script.steps, sink.as_ref(), args.test, &sink_name).await?
        }
        TestKind::Behaviour => {
            let questions = load_behaviour_set(&args.question_set)?;
            let script = load_script::<BehaviourEvent>(&args.script)?;
            let session = BehaviourSession::new(questions, options);
            run(session, script.steps, sink.as_ref(), args.test, &sink_name).await?
        }
    };

    print_transcript(&transcript);

    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
        let filename = format!(
            "transcript-{}.json",
            chrono::Utc::now().format("%Y-%m-%dT%H%M%S")
        );
        let path = dir.join(filename);
        let json = serde_json::to_string_pretty(&transcript)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write transcript: {}", path.display()))?;
        println!("\nTranscript saved to: {}", path.display());
    }

    Ok(())
}

/// Replay `steps` against `session`, carrying out every effect it asks for.
///
/// Step errors are recorded and the replay continues. A navigation effect
/// ends the replay.
async fn run<S: ScriptedSession>(
    mut session: S,
    steps: Vec<S::Event>,
    sink: &dyn SubmissionSink,
    test: TestKind,
    sink_name: &str,
) -> Result<Transcript> {
    let mut media = SimulatedMedia::default();
    let mut records = Vec::with_capacity(steps.len());

    for (i, event) in steps.into_iter().enumerate() {
        let step = i + 1;
        let event_json = serde_json::to_value(&event)?;
        tracing::debug!(step, ?event, "applying step");

        let (outcome, ok, done) = match session.apply(event) {
            Ok(Effect::None) => ("ok".to_string(), true, false),
            Ok(Effect::Media(command)) => {
                command.apply_to(&mut media);
                (
                    format!("media corrected to {:.1}s", media.position),
                    true,
                    false,
                )
            }
            Ok(Effect::Submit(submission)) => {
                let result = sink.submit(&submission).await;
                match session.finish_submit(result) {
                    Ok(()) => ("submitted".to_string(), true, false),
                    Err(e) => (format!("submission failed: {e}"), false, false),
                }
            }
            Ok(Effect::Navigate(destination)) => {
                (format!("navigate to {destination:?}"), true, true)
            }
            Err(e) => (e.to_string(), false, false),
        };

        records.push(StepRecord {
            step,
            event: event_json,
            outcome,
            ok,
        });
        if done {
            break;
        }
    }

    Ok(Transcript {
        session_id: session.id(),
        test: test.to_string(),
        sink: sink_name.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        steps: records,
        final_state: session
            .summary()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    })
}

fn describe(event: &serde_json::Value) -> String {
    let Some(map) = event.as_object() else {
        return event.to_string();
    };
    let action = map.get("action").and_then(|a| a.as_str()).unwrap_or("?");
    let details: Vec<String> = map
        .iter()
        .filter(|(k, _)| k.as_str() != "action")
        .map(|(k, v)| match v.as_str() {
            Some(s) => format!("{k}={s}"),
            None => format!("{k}={v}"),
        })
        .collect();
    if details.is_empty() {
        action.to_string()
    } else {
        format!("{action} {}", details.join(" "))
    }
}

fn print_transcript(transcript: &Transcript) {
    println!(
        "\nSession {} ({} test, sink: {})\n",
        transcript.session_id, transcript.test, transcript.sink
    );

    let mut table = Table::new();
    table.set_header(vec!["#", "Event", "Outcome"]);

    for record in &transcript.steps {
        let marker = if record.ok { "" } else { "✗ " };
        table.add_row(vec![
            Cell::new(record.step),
            Cell::new(describe(&record.event)),
            Cell::new(format!("{marker}{}", record.outcome)),
        ]);
    }
    println!("{table}");

    let mut state = Table::new();
    state.set_header(vec!["Final state", ""]);
    for (key, value) in &transcript.final_state {
        state.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    println!("\n{state}");
}
