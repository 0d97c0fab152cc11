//! The game lifecycle actor.
//!
//! One engine instance manages exactly one channel's game. It reacts to
//! gateway [`Event`]s and to its own timer fires, one message at a time, so
//! no handler ever observes a half-applied transition. Outbound effects are
//! fire-and-forget [`Action`] emissions; nothing here is awaited besides
//! the mailbox itself.

use crate::config::QuizConfig;
use crate::help::Help;
use crate::protocol::{Action, Event, PrivilegeDelta};
use crate::questions::QuestionSource;
use crate::state::{Challenge, QuestionPool, Roster};
use crate::types::Nick;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Everything the engine reacts to.
#[derive(Debug)]
pub enum EngineMsg {
    Event(Event),
    Timer(TimerFire),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One-shot delay between enough players and game start.
    Start,
    /// One-shot delay between rounds.
    Question,
    /// Recurring hint reveal.
    Hint,
}

/// A timer firing. Carries the epoch of the slot that armed it; fires from
/// a slot that has since been re-armed or disarmed are stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFire {
    kind: TimerKind,
    epoch: u64,
}

#[derive(Debug, Default)]
struct Slot {
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

/// Registry of the three scheduled-task slots. At most one live task per
/// slot; arming always disarms first, so the "cancel before re-arm"
/// discipline is enforced in one place instead of at every call site.
#[derive(Debug, Default)]
struct Timers {
    start: Slot,
    question: Slot,
    hint: Slot,
}

impl Timers {
    fn slot(&self, kind: TimerKind) -> &Slot {
        match kind {
            TimerKind::Start => &self.start,
            TimerKind::Question => &self.question,
            TimerKind::Hint => &self.hint,
        }
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut Slot {
        match kind {
            TimerKind::Start => &mut self.start,
            TimerKind::Question => &mut self.question,
            TimerKind::Hint => &mut self.hint,
        }
    }

    fn arm_oneshot(
        &mut self,
        kind: TimerKind,
        delay: Duration,
        mailbox: &mpsc::UnboundedSender<EngineMsg>,
    ) {
        self.disarm(kind);
        let slot = self.slot_mut(kind);
        let fire = TimerFire {
            kind,
            epoch: slot.epoch,
        };
        let mailbox = mailbox.clone();
        slot.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = mailbox.send(EngineMsg::Timer(fire));
        }));
    }

    fn arm_periodic(
        &mut self,
        kind: TimerKind,
        interval: Duration,
        mailbox: &mpsc::UnboundedSender<EngineMsg>,
    ) {
        self.disarm(kind);
        let slot = self.slot_mut(kind);
        let fire = TimerFire {
            kind,
            epoch: slot.epoch,
        };
        let mailbox = mailbox.clone();
        slot.task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if mailbox.send(EngineMsg::Timer(fire)).is_err() {
                    break;
                }
            }
        }));
    }

    /// Abort the slot's task and invalidate any fire it already posted.
    fn disarm(&mut self, kind: TimerKind) {
        let slot = self.slot_mut(kind);
        slot.epoch += 1;
        if let Some(task) = slot.task.take() {
            task.abort();
        }
    }

    fn disarm_all(&mut self) {
        self.disarm(TimerKind::Start);
        self.disarm(TimerKind::Question);
        self.disarm(TimerKind::Hint);
    }

    fn is_armed(&self, kind: TimerKind) -> bool {
        self.slot(kind).task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Check a fire against its slot's current epoch. Accepted one-shot
    /// fires consume the slot.
    fn accepts(&mut self, fire: TimerFire) -> bool {
        let slot = self.slot_mut(fire.kind);
        if fire.epoch != slot.epoch {
            return false;
        }
        if fire.kind != TimerKind::Hint {
            slot.task = None;
        }
        true
    }
}

fn banner(text: &str) -> String {
    format!("*** {text} ***")
}

pub struct QuizGame {
    settings: QuizConfig,
    players: Roster,
    questions: QuestionPool,
    source: Box<dyn QuestionSource>,
    help: Help,
    game_active: bool,
    challenge: Option<Challenge>,
    timers: Timers,
    mailbox: mpsc::UnboundedSender<EngineMsg>,
    inbox: mpsc::UnboundedReceiver<EngineMsg>,
    actions: mpsc::UnboundedSender<Action>,
    rng: StdRng,
}

impl QuizGame {
    pub fn new(
        settings: QuizConfig,
        source: Box<dyn QuestionSource>,
        actions: mpsc::UnboundedSender<Action>,
    ) -> Self {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let help = Help::new(settings.help_dir.clone(), settings.help_cache);
        Self {
            settings,
            players: Roster::new(),
            questions: QuestionPool::new(),
            source,
            help,
            game_active: false,
            challenge: None,
            timers: Timers::default(),
            mailbox,
            inbox,
            actions,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Sender half of the engine mailbox, for the gateway and for tests.
    pub fn mailbox(&self) -> mpsc::UnboundedSender<EngineMsg> {
        self.mailbox.clone()
    }

    /// Process messages until every mailbox sender is gone.
    pub async fn run(mut self) {
        tracing::info!(channel = %self.settings.channel, "quiz engine running");
        while let Some(msg) = self.inbox.recv().await {
            self.dispatch(msg);
        }
        tracing::info!("quiz engine mailbox closed, shutting down");
    }

    fn dispatch(&mut self, msg: EngineMsg) {
        match msg {
            EngineMsg::Event(event) => self.handle_event(event),
            EngineMsg::Timer(fire) => self.handle_timer(fire),
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Join { nick } => self.add_player(&nick),
            Event::Leave { nick } | Event::Disconnect { nick } => self.remove_player(&nick),
            Event::Rename { old_nick, new_nick } => self.update_player(&old_nick, &new_nick),
            Event::Message { nick, text } => self.handle_message(&nick, &text),
        }
    }

    fn handle_timer(&mut self, fire: TimerFire) {
        if !self.timers.accepts(fire) {
            tracing::debug!(?fire, "dropping stale timer fire");
            return;
        }
        match fire.kind {
            TimerKind::Start => self.on_game_start(),
            TimerKind::Question => self.on_question_due(),
            TimerKind::Hint => self.give_hint(),
        }
    }

    /// Classify channel text. `!score` and `!help` work for anyone,
    /// `!play` for spectators; `!quit`, `!revolt` and plain-text guesses
    /// only count from players. Unknown commands are ignored.
    fn handle_message(&mut self, nick: &str, text: &str) {
        if let Some(command) = text.strip_prefix('!') {
            if command.starts_with("score") {
                self.tell_score();
            } else if let Some(category) = command.strip_prefix("help") {
                let category = category.trim().to_string();
                self.tell_help(nick, &category);
            } else if self.players.is_player(nick) {
                if command.starts_with("quit") {
                    self.remove_player(nick);
                } else if command.starts_with("revolt") {
                    self.handle_revolt(nick);
                }
            } else if command.starts_with("play") {
                self.add_player(nick);
            }
        } else if self.players.is_player(nick) {
            self.handle_guess(nick, text);
        }
    }

    fn add_player(&mut self, nick: &str) {
        if self.players.is_player(nick) {
            return;
        }
        if self.game_active {
            self.notify(nick, "Game is already running.");
            return;
        }

        if self.settings.moderated {
            self.send_privilege(PrivilegeDelta::Grant, Some(nick.to_string()));
        }

        self.tell_to_channel(format!("Player {nick} has joined the game."));
        self.players.add_player(nick);
        tracing::info!(nick, players = self.players.len(), "player joined");

        match self.players.len() {
            2 => {
                self.tell_to_channel("Enough players found for new game.");
                self.begin_game();
            }
            // Later joins re-trigger the countdown, pushing the start back.
            n if n > 2 => {
                self.tell_to_channel("Additional player joined the game.");
                self.begin_game();
            }
            _ => {}
        }
    }

    fn remove_player(&mut self, nick: &str) {
        if !self.players.is_player(nick) {
            return;
        }

        if self.settings.moderated {
            self.send_privilege(PrivilegeDelta::Revoke, Some(nick.to_string()));
        }

        self.tell_to_channel(format!("Player {nick} has quit the game."));
        self.players.remove_player(nick);
        tracing::info!(nick, players = self.players.len(), "player left");

        if self.players.len() == 1 {
            // The game cannot continue alone. Any pending countdown dies;
            // a live round resolves with no winner before the game ends.
            self.timers.disarm(TimerKind::Start);
            if self.game_active {
                if self.challenge.is_some() {
                    self.finish_challenge(None);
                }
                self.end_game("Last man standing.");
            }
        }
    }

    fn update_player(&mut self, old_nick: &str, new_nick: &str) {
        if self.players.is_player(old_nick) {
            self.players.update_player(old_nick, new_nick);
            tracing::debug!(old_nick, new_nick, "player renamed");
        }
    }

    /// Announce a countdown and (re)arm the start timer.
    fn begin_game(&mut self) {
        self.tell_to_channel(format!(
            "Game starting in {} seconds.",
            self.settings.start_delay.as_secs()
        ));
        self.timers
            .arm_oneshot(TimerKind::Start, self.settings.start_delay, &self.mailbox);
    }

    fn on_game_start(&mut self) {
        self.game_active = true;

        let source_id = self.settings.source.clone();
        let limit = self.settings.batch_size;
        if let Err(error) =
            self.questions
                .load(self.source.as_ref(), &source_id, limit, &mut self.rng)
        {
            tracing::error!(%error, %source_id, "failed to load question source");
            self.end_game("Question source unavailable.");
            return;
        }

        if self.settings.moderated {
            self.send_privilege(PrivilegeDelta::Grant, None);
        }

        self.tell_to_channel(banner("GAME STARTS"));
        self.tell_to_channel(format!(
            "Total questions: {}; Using: {}; Remaining: {}",
            self.questions.total(),
            self.questions.current_len(),
            self.questions.remaining_len()
        ));
        self.tell_to_channel(format!("Players: {}", self.players.nicks().join(", ")));

        self.next_challenge();
    }

    fn end_game(&mut self, reason: &str) {
        self.timers.disarm_all();

        if !self.game_active {
            return;
        }
        tracing::info!(reason, "game over");

        self.tell_to_channel(format!("{} {reason}", banner("GAME OVER")));
        self.tell_score();

        self.game_active = false;
        self.challenge = None;
        self.tell_to_channel("Thank you for playing.");

        if self.settings.moderated {
            self.send_privilege(PrivilegeDelta::Revoke, None);
            for nick in self.players.nicks() {
                self.send_privilege(PrivilegeDelta::Revoke, Some(nick));
            }
        }

        self.players.remove_all();
    }

    /// Schedule the next round unless one is live or already scheduled.
    fn next_challenge(&mut self) {
        if !self.game_active {
            return;
        }
        if self.challenge.is_some() {
            // Finish the current challenge first.
            return;
        }
        if self.timers.is_armed(TimerKind::Question) {
            // Next challenge already scheduled.
            return;
        }
        if self.questions.current_len() == 0 {
            self.end_game("No more questions.");
            return;
        }
        self.timers.arm_oneshot(
            TimerKind::Question,
            self.settings.question_delay,
            &self.mailbox,
        );
    }

    fn on_question_due(&mut self) {
        if !self.game_active {
            return;
        }
        let Some(record) = self.questions.pop() else {
            self.end_game("No more questions.");
            return;
        };

        match Challenge::new(&record, &mut self.rng) {
            Ok(challenge) => {
                let dealt = self.questions.current_limit() - self.questions.current_len();
                self.tell_to_channel(format!(
                    "{} {dealt} / {}",
                    banner("NEW QUESTION"),
                    self.questions.current_limit()
                ));
                self.tell_to_channel(challenge.question().to_string());
                self.tell_to_channel(challenge.hint_placeholder());

                self.challenge = Some(challenge);
                self.timers.arm_periodic(
                    TimerKind::Hint,
                    self.settings.hint_interval,
                    &self.mailbox,
                );
            }
            Err(error) => {
                tracing::warn!(%error, question = %record.question, "skipping unusable question");
                self.next_challenge();
            }
        }
    }

    /// Resolve the live round. Does not advance by itself: round-ending by
    /// player departure must not schedule another question.
    fn finish_challenge(&mut self, winner: Option<&str>) {
        let Some(challenge) = self.challenge.take() else {
            return;
        };
        self.timers.disarm(TimerKind::Hint);
        self.players.reset_revoltees();

        let message = match winner {
            Some(nick) => {
                self.players.increase_score(nick, 1);
                format!("{nick} had the correct answer!")
            }
            None => "The question went unanswered.".to_string(),
        };

        self.tell_to_channel(format!("{} {message}", banner("QUESTION END")));
        self.tell_to_channel(format!("Question: {}", challenge.question()));
        self.tell_to_channel(format!("Answer: {}", challenge.hint_string()));
        self.tell_score();
    }

    fn handle_guess(&mut self, nick: &str, text: &str) {
        let Some(challenge) = &self.challenge else {
            return;
        };
        if challenge.check_guess(text) {
            tracing::info!(nick, "correct answer");
            self.finish_challenge(Some(nick));
            self.next_challenge();
        }
    }

    fn handle_revolt(&mut self, nick: &str) {
        let Some(challenge) = &self.challenge else {
            return;
        };

        if self.players.is_revolting(nick) {
            self.notify(nick, "You are already revolting.");
        } else if challenge.hints_given() < 1 {
            self.tell_to_channel("Revolting is only possible after the first hint.");
        } else {
            self.players.set_revoltee(nick);
            self.tell_to_channel(format!("{nick} is revolting!"));

            // Strict majority; ties fail.
            if self.players.revoltees().len() * 2 > self.players.len() {
                self.tell_to_channel("Revolt successful. The quiz master gives in.");
                self.finish_challenge(None);
                self.next_challenge();
            } else {
                self.tell_to_channel("The mob is negligible. The quiz master is not impressed.");
            }
        }
    }

    /// Recurring hint tick. With fewer than two masked characters left the
    /// question is exhausted and resolves unanswered.
    fn give_hint(&mut self) {
        let remaining = match &self.challenge {
            Some(challenge) => challenge.hints_remaining(),
            None => return,
        };

        if remaining < 2 {
            self.finish_challenge(None);
            self.next_challenge();
            return;
        }

        if let Some(challenge) = self.challenge.as_mut() {
            challenge.add_hint();
            let question = challenge.question().to_string();
            let placeholder = challenge.hint_placeholder();
            self.tell_to_channel(question);
            self.tell_to_channel(placeholder);
        }
    }

    fn tell_score(&self) {
        let line = if self.game_active {
            let ranking: Vec<String> = self
                .players
                .ranking()
                .iter()
                .map(|p| format!("{}. {} ({})", p.position, p.nick, p.score))
                .collect();
            format!("{} {}", banner("SCORE"), ranking.join(", "))
        } else {
            format!("{} No active game.", banner("SCORE"))
        };
        self.tell_to_channel(line);
    }

    fn tell_help(&mut self, recipient: &str, category: &str) {
        let lines = self.help.lines(category);
        self.notify_lines(recipient, lines);
    }

    fn tell_to_channel(&self, text: impl Into<String>) {
        let line = self.prefixed(text.into());
        self.emit(Action::Announce { lines: vec![line] });
    }

    fn notify(&self, recipient: &str, text: impl Into<String>) {
        let line = self.prefixed(text.into());
        self.emit(Action::Notify {
            recipient: recipient.to_string(),
            lines: vec![line],
        });
    }

    fn notify_lines(&self, recipient: &str, lines: Vec<String>) {
        let lines = lines.into_iter().map(|l| self.prefixed(l)).collect();
        self.emit(Action::Notify {
            recipient: recipient.to_string(),
            lines,
        });
    }

    fn send_privilege(&self, delta: PrivilegeDelta, nick: Option<Nick>) {
        self.emit(Action::Privilege {
            channel: self.settings.channel.clone(),
            delta,
            nick,
        });
    }

    fn prefixed(&self, text: String) -> String {
        format!("{}{}", self.settings.prefix, text)
    }

    fn emit(&self, action: Action) {
        if self.actions.send(action).is_err() {
            tracing::debug!("gateway closed, dropping action");
        }
    }
}
