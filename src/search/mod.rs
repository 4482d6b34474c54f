/**
 * Search Module
 *
 * `planner` holds the stronger/weaker/unchanged/not-found heuristic with
 * no hardware attached; `finder` runs it against the robot.
 */

pub mod planner;
pub mod finder;

pub use planner::{Decision, Heading, SearchPlanner, Turn};
pub use finder::{PhoneFinder, RunSummary, StepReport};
