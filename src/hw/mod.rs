/**
 * Hardware seams
 *
 * Everything the search loop touches on the robot goes through one of
 * these traits. Production backends live in `uart`, `bluetooth`,
 * `display` and `speech`; simulated ones in `sim`.
 */

use crate::bluetooth::Sighting;
use crate::display::Frame;
use crate::error::Result;

/// Gait actions understood by the motion co-processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CrawlerAction{
    Forward = 0x01,
    TurnLeft = 0x03,
    TurnRight = 0x04,
}

impl CrawlerAction{
    pub fn name(&self) -> &'static str{
        match self{
            CrawlerAction::Forward => "forward",
            CrawlerAction::TurnLeft => "turn left",
            CrawlerAction::TurnRight => "turn right",
        }
    }
}

pub trait Crawler: Send{
    /// Run `steps` repetitions of a gait action; blocks until the body is done
    fn do_action(&mut self, action: CrawlerAction, steps: u8, speed: u8) -> Result<()>;
}

pub trait RangeSensor: Send{
    /// Distance to the nearest obstacle in cm, negative when there was no echo
    fn read_distance(&mut self) -> Result<f32>;
}

pub trait Speaker: Send{
    fn say(&mut self, text: &str) -> Result<()>;
}

pub trait Display: Send{
    fn show(&mut self, frame: &Frame) -> Result<()>;
}

/// One Bluetooth discovery pass
pub trait Inquiry: Send{
    fn inquire(&mut self) -> Result<Vec<Sighting>>;
}

/// The full set of handles the search loop drives
pub struct Hardware{
    pub inquiry: Box<dyn Inquiry>,
    pub crawler: Box<dyn Crawler>,
    pub sonar: Box<dyn RangeSensor>,
    pub speaker: Box<dyn Speaker>,
    pub display: Box<dyn Display>,
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_action_wire_values(){
        assert_eq!(CrawlerAction::Forward as u8, 0x01);
        assert_eq!(CrawlerAction::TurnLeft as u8, 0x03);
        assert_eq!(CrawlerAction::TurnRight as u8, 0x04);
    }

    #[test]
    fn test_action_names(){
        assert_eq!(CrawlerAction::TurnLeft.name(), "turn left");
        assert_eq!(CrawlerAction::Forward.name(), "forward");
    }
}
