//! Raw file intake: validate → upload → bind → stage.

mod intake;

pub use intake::{FileIntake, IntakeOutcome};
