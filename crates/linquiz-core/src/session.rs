//! Session state machine and the line-based driver around it.
//!
//! A session walks the questions strictly in order. Each question stays in
//! `AwaitingInput` until it receives a non-hint line; `h` shows the hint and
//! re-prompts without producing an attempt.

use std::io::BufRead;

use crate::grading::is_hint_request;
use crate::model::Question;
use crate::results::{Attempt, ResultSet};

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for an answer to the question with this id.
    AwaitingInput(u32),
    Complete,
}

/// What a single input line did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The hint was requested; the same question is still pending.
    Hint(String),
    /// The pending question was answered or skipped.
    Answered(Attempt),
    /// Input arrived after the last question.
    Finished,
}

/// One pass over a question list.
#[derive(Debug)]
pub struct Session<'a> {
    questions: &'a [Question],
    position: usize,
    results: ResultSet,
}

impl<'a> Session<'a> {
    pub fn new(questions: &'a [Question]) -> Self {
        Self {
            questions,
            position: 0,
            results: ResultSet::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.current() {
            Some(q) => SessionState::AwaitingInput(q.id),
            None => SessionState::Complete,
        }
    }

    /// The question waiting for input, if any.
    pub fn current(&self) -> Option<&'a Question> {
        self.questions.get(self.position)
    }

    /// Feed one line of user input.
    pub fn submit(&mut self, input: &str) -> Step {
        let Some(question) = self.current() else {
            return Step::Finished;
        };

        if is_hint_request(input) {
            return Step::Hint(question.hint.clone());
        }

        let attempt = Attempt::evaluate(question, input);
        self.results.record(attempt.clone());
        self.position += 1;
        Step::Answered(attempt)
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn is_complete(&self) -> bool {
        self.state() == SessionState::Complete
    }

    pub fn finish(self) -> ResultSet {
        self.results
    }
}

/// Observer for the console (or a test) to render session progress.
pub trait SessionReporter {
    /// A new question is being asked. `index` is 1-based.
    fn on_question(&self, index: usize, total: usize, question: &Question);
    /// Called before every line read.
    fn on_input_prompt(&self) {}
    fn on_hint(&self, question: &Question, hint: &str);
    fn on_attempt(&self, question: &Question, attempt: &Attempt);
}

/// Reporter that renders nothing.
pub struct NoopReporter;

impl SessionReporter for NoopReporter {
    fn on_question(&self, _: usize, _: usize, _: &Question) {}
    fn on_hint(&self, _: &Question, _: &str) {}
    fn on_attempt(&self, _: &Question, _: &Attempt) {}
}

/// Result of driving a session from an input stream.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub results: ResultSet,
    /// `false` when the input ended before the last question.
    pub completed: bool,
}

/// Run a full session, reading one answer per line from `input`.
///
/// End of input stops the session early and returns the attempts gathered
/// so far.
pub fn run_session<R: BufRead + ?Sized>(
    questions: &[Question],
    input: &mut R,
    reporter: &dyn SessionReporter,
) -> std::io::Result<SessionOutcome> {
    let mut session = Session::new(questions);
    let total = questions.len();
    let mut buf = Vec::new();

    while let Some(question) = session.current() {
        reporter.on_question(session.results().len() + 1, total, question);

        loop {
            reporter.on_input_prompt();
            let Some(line) = read_input_line(input, &mut buf)? else {
                tracing::debug!(question = question.id, "input closed, ending session early");
                return Ok(SessionOutcome {
                    results: session.finish(),
                    completed: false,
                });
            };

            match session.submit(&line) {
                Step::Hint(hint) => reporter.on_hint(question, &hint),
                Step::Answered(attempt) => {
                    reporter.on_attempt(question, &attempt);
                    break;
                }
                Step::Finished => break,
            }
        }
    }

    let completed = session.is_complete();
    Ok(SessionOutcome {
        results: session.finish(),
        completed,
    })
}

/// Read one line, replacing invalid UTF-8 with U+FFFD. `None` at end of
/// input.
pub fn read_input_line<R: BufRead + ?Sized>(
    input: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    if input.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}
