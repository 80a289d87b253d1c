//! Guard conversations and response flavour.
//!
//! A security conversation runs through a fixed number of layers. Each layer
//! the player picks one [`DialogueChoice`]; the session counts provocations
//! with a [`ProvocationTally`] and, at the end, hands the guard a
//! [`DialogueVerdict`]. The outcome depends only on the sequence of choices.
//! Only the wording of the replies is random.
//!
//! ```text
//!   layer 1          layer 2          layer 3
//!   Provoke  ──▶     Cooperate ──▶    Provoke    ⇒  Chase(player)
//!   Appease  ──▶     Cooperate ──▶    Cooperate  ⇒  DisableChasing
//! ```

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use guard_core::escalation::{DialogueVerdict, ProvocationTally};
use guard_core::EntityId;

use crate::bridge::TrustBand;

/// Layers in a security conversation unless configured otherwise.
pub const DEFAULT_LAYERS: usize = 3;

// ---------------------------------------------------------------------------
// Choices & flavour
// ---------------------------------------------------------------------------

/// What the player says to a guard at one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogueChoice {
    /// Answer the question.
    Cooperate,
    /// Mouth off.
    Provoke,
    /// Smooth things over; the guard stops treating the player as a suspect.
    Appease,
}

impl DialogueChoice {
    /// How the guard takes it.
    #[must_use]
    pub fn flavor(self) -> ResponseFlavor {
        match self {
            Self::Cooperate => ResponseFlavor::Neutral,
            Self::Provoke => ResponseFlavor::Annoyed,
            Self::Appease => ResponseFlavor::Pleased,
        }
    }
}

/// Tone of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseFlavor {
    /// The last change helped.
    Pleased,
    /// Nothing changed.
    Neutral,
    /// The last change hurt.
    Annoyed,
}

impl ResponseFlavor {
    /// Tone implied by the sign of a trust change.
    #[must_use]
    pub fn from_delta(delta: i32) -> Self {
        match delta.signum() {
            1 => Self::Pleased,
            -1 => Self::Annoyed,
            _ => Self::Neutral,
        }
    }
}

const PLEASED_LINES: &[&str] = &[
    "Now that's more like it.",
    "Appreciate it. Really.",
    "Good. We understand each other.",
    "Well, that's a relief.",
];

const NEUTRAL_LINES: &[&str] = &[
    "Go on.",
    "Hm. Noted.",
    "If you say so.",
    "Right.",
];

const ANNOYED_LINES: &[&str] = &[
    "Watch your tone.",
    "You're not making this easy.",
    "I've had about enough of that.",
    "Careful. I'm keeping an eye on you.",
];

/// Pick a reply line for `flavor`.
#[must_use]
pub fn response_line<R: Rng + ?Sized>(flavor: ResponseFlavor, rng: &mut R) -> &'static str {
    let pool = match flavor {
        ResponseFlavor::Pleased => PLEASED_LINES,
        ResponseFlavor::Neutral => NEUTRAL_LINES,
        ResponseFlavor::Annoyed => ANNOYED_LINES,
    };
    pool.choose(rng).copied().unwrap_or("...")
}

/// Opening line of a security conversation, coloured by how the calling NPC
/// feels about the player.
#[must_use]
pub fn greeting(guard_name: &str, band: Option<TrustBand>) -> String {
    match band {
        Some(TrustBand::Hostile) => {
            format!("{guard_name}: That's the one. You're coming with me unless you talk fast.")
        }
        Some(TrustBand::Wary) => {
            format!("{guard_name}: Staff say you've been causing trouble. Care to explain?")
        }
        Some(TrustBand::Cordial | TrustBand::Devoted) | None => {
            format!("{guard_name}: Evening. Mind if I ask you a few questions?")
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Result of one choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStep {
    /// More layers follow; the value is the next layer (1-based).
    Continue(usize),
    /// That was the last layer.
    Finished,
}

/// One guard conversation in progress.
#[derive(Debug, Clone)]
pub struct GuardDialogue {
    guard: EntityId,
    speaker: EntityId,
    layers: usize,
    choices: Vec<DialogueChoice>,
    tally: ProvocationTally,
}

impl GuardDialogue {
    /// A conversation between `guard` and `speaker` lasting `layers`
    /// choices (at least one).
    #[must_use]
    pub fn new(guard: EntityId, speaker: EntityId, layers: usize) -> Self {
        Self {
            guard,
            speaker,
            layers: layers.max(1),
            choices: Vec::new(),
            tally: ProvocationTally::default(),
        }
    }

    /// Record the player's choice at the current layer. Choices after the
    /// last layer are ignored.
    pub fn choose(&mut self, choice: DialogueChoice) -> DialogueStep {
        if self.is_finished() {
            return DialogueStep::Finished;
        }
        match choice {
            DialogueChoice::Provoke => self.tally.provoke(),
            DialogueChoice::Appease => self.tally.pacify(),
            DialogueChoice::Cooperate => {}
        }
        self.choices.push(choice);
        if self.is_finished() {
            DialogueStep::Finished
        } else {
            DialogueStep::Continue(self.choices.len() + 1)
        }
    }

    /// What the guard should do now if the conversation ended here.
    #[must_use]
    pub fn verdict(&self) -> DialogueVerdict {
        self.tally.verdict(self.speaker)
    }

    /// Whether every layer has been answered.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.choices.len() >= self.layers
    }

    /// The guard in this conversation.
    #[must_use]
    pub fn guard(&self) -> EntityId {
        self.guard
    }

    /// Who is talking to the guard.
    #[must_use]
    pub fn speaker(&self) -> EntityId {
        self.speaker
    }

    /// Choices made so far.
    #[must_use]
    pub fn choices(&self) -> &[DialogueChoice] {
        &self.choices
    }

    /// Provocations so far.
    #[must_use]
    pub fn provocations(&self) -> u32 {
        self.tally.count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn run(choices: &[DialogueChoice]) -> (GuardDialogue, DialogueStep) {
        let mut session = GuardDialogue::new(EntityId::new(), EntityId::new(), DEFAULT_LAYERS);
        let mut step = DialogueStep::Continue(1);
        for &choice in choices {
            step = session.choose(choice);
        }
        (session, step)
    }

    #[test]
    fn two_provokes_across_three_layers_chase() {
        use DialogueChoice::{Cooperate, Provoke};
        let (session, step) = run(&[Provoke, Cooperate, Provoke]);
        assert_eq!(step, DialogueStep::Finished);
        assert_eq!(session.provocations(), 2);
        assert_eq!(session.verdict(), DialogueVerdict::Chase(session.speaker()));
    }

    #[test]
    fn appease_disables_chasing() {
        use DialogueChoice::{Appease, Cooperate};
        let (session, _) = run(&[Appease, Cooperate, Cooperate]);
        assert_eq!(session.verdict(), DialogueVerdict::DisableChasing);
    }

    #[test]
    fn provoking_past_the_limit_beats_appeasing() {
        use DialogueChoice::{Appease, Provoke};
        let (session, _) = run(&[Provoke, Appease, Provoke]);
        assert_eq!(session.verdict(), DialogueVerdict::Chase(session.speaker()));
    }

    #[test]
    fn layers_count_up_and_extra_choices_are_ignored() {
        let mut session = GuardDialogue::new(EntityId::new(), EntityId::new(), 2);
        assert_eq!(session.choose(DialogueChoice::Cooperate), DialogueStep::Continue(2));
        assert_eq!(session.choose(DialogueChoice::Cooperate), DialogueStep::Finished);
        assert_eq!(session.choose(DialogueChoice::Provoke), DialogueStep::Finished);
        assert_eq!(session.choices().len(), 2);
        assert_eq!(session.verdict(), DialogueVerdict::Resume);
    }

    #[test]
    fn same_choices_same_verdict() {
        use DialogueChoice::{Cooperate, Provoke};
        let seq = [Provoke, Cooperate, Cooperate];
        let (a, _) = run(&seq);
        let (b, _) = run(&seq);
        assert_eq!(a.provocations(), b.provocations());
        assert_eq!(a.verdict(), DialogueVerdict::Resume);
        assert_eq!(b.verdict(), DialogueVerdict::Resume);
    }

    #[test]
    fn flavour_follows_delta_sign() {
        assert_eq!(ResponseFlavor::from_delta(10), ResponseFlavor::Pleased);
        assert_eq!(ResponseFlavor::from_delta(0), ResponseFlavor::Neutral);
        assert_eq!(ResponseFlavor::from_delta(-3), ResponseFlavor::Annoyed);
    }

    #[test]
    fn lines_come_from_the_matching_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert!(ANNOYED_LINES.contains(&response_line(ResponseFlavor::Annoyed, &mut rng)));
            assert!(PLEASED_LINES.contains(&response_line(ResponseFlavor::Pleased, &mut rng)));
        }
    }

    #[test]
    fn greeting_reflects_the_caller() {
        assert!(greeting("Marco", Some(TrustBand::Hostile)).contains("coming with me"));
        assert!(greeting("Marco", None).starts_with("Marco:"));
    }
}
