//! Six-sided dice for token movement.
//!
//! A roll always commits a face in 1..=6. Raw faces come from a
//! [`FaceSource`]; out-of-range faces are retried a fixed number of times and
//! then replaced by a safe fallback face.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Lowest face on the die.
pub const MIN_FACE: u8 = 1;

/// Highest face on the die.
pub const MAX_FACE: u8 = 6;

/// Attempts made against the face source before falling back.
pub const MAX_ROLL_ATTEMPTS: usize = 3;

/// Face committed when the source never produced a valid one.
pub const FALLBACK_FACE: u8 = 1;

/// Error type for die faces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid die face: {0} (expected 1-6)")]
    InvalidFace(i64),
}

/// A validated face of a six-sided die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DieFace(u8);

impl DieFace {
    /// Validate a raw face.
    pub fn new(raw: i64) -> Result<Self, DiceError> {
        if (MIN_FACE as i64..=MAX_FACE as i64).contains(&raw) {
            Ok(Self(raw as u8))
        } else {
            Err(DiceError::InvalidFace(raw))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Rolling the top face earns another roll.
    pub fn grants_extra_roll(self) -> bool {
        self.0 == MAX_FACE
    }
}

impl TryFrom<u8> for DieFace {
    type Error = DiceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DieFace::new(value as i64)
    }
}

impl From<DieFace> for u8 {
    fn from(face: DieFace) -> u8 {
        face.0
    }
}

impl fmt::Display for DieFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything that can produce raw die faces.
///
/// Sources are not trusted: a source may return values outside 1..=6 and
/// [`Dice`] is responsible for rejecting them.
pub trait FaceSource {
    fn next_face(&mut self) -> i64;
}

impl<F: FaceSource + ?Sized> FaceSource for Box<F> {
    fn next_face(&mut self) -> i64 {
        (**self).next_face()
    }
}

/// Uniform faces drawn from a random number generator.
#[derive(Debug, Clone)]
pub struct RngFaces<R> {
    rng: R,
}

impl<R: Rng> RngFaces<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngFaces<StdRng> {
    /// Faces seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible faces for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> FaceSource for RngFaces<R> {
    fn next_face(&mut self) -> i64 {
        self.rng.gen_range(MIN_FACE as i64..=MAX_FACE as i64)
    }
}

/// The committed result of one roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roll {
    pub face: DieFace,
    /// True when the source failed every attempt and the fallback was used.
    pub fell_back: bool,
    /// Source draws consumed by this roll.
    pub attempts: usize,
}

impl Roll {
    pub fn value(&self) -> u8 {
        self.face.value()
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fell_back {
            write!(f, "{} (fallback)", self.face)
        } else {
            write!(f, "{}", self.face)
        }
    }
}

/// A multi-step reveal of a roll.
///
/// The roll is committed before any frame exists; the frames are cosmetic
/// and the last one always shows the committed face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollAnimation {
    pub roll: Roll,
    pub frames: Vec<DieFace>,
}

impl RollAnimation {
    /// Build a reveal of `frame_count` faces ending on the committed face.
    pub fn reveal<R: Rng + ?Sized>(roll: Roll, frame_count: usize, rng: &mut R) -> Self {
        let mut frames: Vec<DieFace> = (0..frame_count.saturating_sub(1))
            .map(|_| DieFace(rng.gen_range(MIN_FACE..=MAX_FACE)))
            .collect();
        frames.push(roll.face);
        Self { roll, frames }
    }

    pub fn committed(&self) -> DieFace {
        self.roll.face
    }
}

/// A six-sided die over a face source.
///
/// Reveal frames are drawn from a separate generator so that seeding it
/// makes whole roll animations reproducible.
pub struct Dice<S> {
    source: S,
    frames: StdRng,
}

impl<S: FaceSource> Dice<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            frames: StdRng::from_entropy(),
        }
    }

    /// Seed the generator behind the reveal frames.
    pub fn with_frame_seed(mut self, seed: u64) -> Self {
        self.frames = StdRng::seed_from_u64(seed);
        self
    }

    /// Roll once, retrying invalid source faces before falling back.
    pub fn roll(&mut self) -> Roll {
        for attempt in 1..=MAX_ROLL_ATTEMPTS {
            let raw = self.source.next_face();
            match DieFace::new(raw) {
                Ok(face) => {
                    return Roll {
                        face,
                        fell_back: false,
                        attempts: attempt,
                    }
                }
                Err(err) => debug!(attempt, %err, "Discarding out-of-range die face"),
            }
        }

        warn!(
            attempts = MAX_ROLL_ATTEMPTS,
            fallback = FALLBACK_FACE,
            "Dice source produced no valid face, using fallback"
        );
        Roll {
            face: DieFace(FALLBACK_FACE),
            fell_back: true,
            attempts: MAX_ROLL_ATTEMPTS,
        }
    }

    /// Commit a roll, then build its reveal animation.
    pub fn roll_animated(&mut self, frame_count: usize) -> RollAnimation {
        let roll = self.roll();
        RollAnimation::reveal(roll, frame_count, &mut self.frames)
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl Dice<RngFaces<StdRng>> {
    /// A fair die seeded from the operating system.
    pub fn fair() -> Self {
        Self::new(RngFaces::from_entropy())
    }
}
