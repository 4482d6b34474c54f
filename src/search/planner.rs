use crate::signal::{RssiSmoother, SignalRange};

pub const TURN_STEP_DEG: i32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn{
    Left,
    Right,
}

impl Turn{
    pub fn opposite(self) -> Turn{
        match self{
            Turn::Left => Turn::Right,
            Turn::Right => Turn::Left,
        }
    }
}

/// Dead-reckoned heading in whole degrees, 0 = where the robot started (12 o'clock)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heading(u16);

impl Heading{
    pub fn new(degrees: i32) -> Self{
        Heading(degrees.rem_euclid(360) as u16)
    }

    pub fn degrees(&self) -> u16{
        self.0
    }

    pub fn turned(self, turn: Turn) -> Heading{
        match turn{
            Turn::Left => Heading::new(self.0 as i32 - TURN_STEP_DEG),
            Turn::Right => Heading::new(self.0 as i32 + TURN_STEP_DEG),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision{
    /// First reading after start (or after losing the phone for good), nothing to compare
    FirstFix{ smoothed: f32 },
    Stronger{ smoothed: f32, previous: f32 },
    Weaker{ smoothed: f32, previous: f32 },
    Unchanged{ smoothed: f32 },
    NotFound,
}

impl Decision{
    pub fn smoothed(&self) -> Option<f32>{
        match *self{
            Decision::FirstFix{ smoothed }
            | Decision::Stronger{ smoothed, .. }
            | Decision::Weaker{ smoothed, .. }
            | Decision::Unchanged{ smoothed } => Some(smoothed),
            Decision::NotFound => None,
        }
    }

    /// What the robot says (and logs) for this decision
    pub fn message(&self) -> Option<&'static str>{
        match self{
            Decision::FirstFix{ .. } => None,
            Decision::Stronger{ .. } => Some("Signal stronger. Continuing forward."),
            Decision::Weaker{ .. } => Some("Signal weaker. Turning to find stronger signal."),
            Decision::Unchanged{ .. } => Some("Signal unchanged. Adjusting direction."),
            Decision::NotFound => Some("Phone not detected. Scanning..."),
        }
    }

    /// The scripted turn; `Stronger` only turns when it runs into an obstacle
    pub fn turn(&self) -> Option<Turn>{
        match self{
            Decision::Weaker{ .. } | Decision::NotFound => Some(Turn::Left),
            Decision::Unchanged{ .. } => Some(Turn::Right),
            Decision::FirstFix{ .. } | Decision::Stronger{ .. } => None,
        }
    }

    pub fn label(&self) -> &'static str{
        match self{
            Decision::FirstFix{ .. } => "first_fix",
            Decision::Stronger{ .. } => "stronger",
            Decision::Weaker{ .. } => "weaker",
            Decision::Unchanged{ .. } => "unchanged",
            Decision::NotFound => "not_found",
        }
    }
}

/// Hardware-free half of the search: smoothing, comparison and heading bookkeeping
pub struct SearchPlanner{
    smoother: RssiSmoother,
    previous: Option<f32>,
    heading: Heading,
    range: SignalRange,
}

impl SearchPlanner{
    pub fn new(window: usize, range: SignalRange) -> Self{
        SearchPlanner{
            smoother: RssiSmoother::new(window),
            previous: None,
            heading: Heading::default(),
            range,
        }
    }

    /// Classify a fresh scan result. A found reading becomes the next comparison point;
    /// a miss (or a non-finite reading) leaves the previous reading alone.
    pub fn decide(&mut self, reading: Option<f32>) -> Decision{
        let rssi = match reading{
            Some(rssi) if rssi.is_finite() => rssi,
            Some(rssi) =>{
                log::warn!("[FIND] ignoring RSSI reading {}", rssi);
                return Decision::NotFound;
            }
            None => return Decision::NotFound,
        };

        let smoothed = self.smoother.push(rssi);
        let decision = match self.previous{
            None => Decision::FirstFix{ smoothed },
            Some(previous) if smoothed > previous => Decision::Stronger{ smoothed, previous },
            Some(previous) if smoothed < previous => Decision::Weaker{ smoothed, previous },
            Some(_) => Decision::Unchanged{ smoothed },
        };

        self.previous = Some(smoothed);
        decision
    }

    pub fn apply_turn(&mut self, turn: Turn) -> Heading{
        self.heading = self.heading.turned(turn);
        self.heading
    }

    pub fn heading(&self) -> Heading{
        self.heading
    }

    pub fn previous(&self) -> Option<f32>{
        self.previous
    }

    pub fn signal_angle(&self, smoothed: f32) -> f32{
        self.range.angle(smoothed)
    }

    pub fn reset(&mut self){
        self.smoother.reset();
        self.previous = None;
        self.heading = Heading::default();
    }
}

impl Default for SearchPlanner{
    fn default() -> Self{
        SearchPlanner::new(crate::signal::DEFAULT_WINDOW, SignalRange::default())
    }
}
