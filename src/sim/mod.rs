/**
 * Simulated Hardware
 *
 * Stand-ins for every hardware seam, used by `--simulate` runs and by
 * the tests. Recorders share their state through Arc<RwLock<..>> so a
 * test can keep a handle after boxing the device into `Hardware`.
 */

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use crate::bluetooth::{MacAddress, Sighting};
use crate::display::Frame;
use crate::error::{Error, Result};
use crate::hw::{Crawler, CrawlerAction, Display, Inquiry, RangeSensor, Speaker};

/// Replays discovery passes in order; the last pass repeats forever
pub struct SimInquiry{
    passes: VecDeque<Vec<Sighting>>,
    last: Vec<Sighting>,
    fail_next: usize,
}

impl SimInquiry{
    pub fn from_passes(passes: Vec<Vec<Sighting>>) -> Self{
        SimInquiry{
            passes: passes.into(),
            last: Vec::new(),
            fail_next: 0,
        }
    }

    /// One pass per entry: the phone at that RSSI, or absent for `None`
    pub fn scripted(phone: MacAddress, rssi: &[Option<f32>]) -> Self{
        let passes = rssi.iter()
            .map(|r| match r{
                Some(rssi) => vec![Sighting{ address: phone, name: Some("phone".to_string()), rssi: *rssi }],
                None => Vec::new(),
            })
            .collect();
        Self::from_passes(passes)
    }

    /// Make the next `count` passes fail before the script resumes
    pub fn failing(mut self, count: usize) -> Self{
        self.fail_next = count;
        self
    }
}

impl Inquiry for SimInquiry{
    fn inquire(&mut self) -> Result<Vec<Sighting>>{
        if self.fail_next > 0{
            self.fail_next -= 1;
            return Err(Error::Bluetooth("simulated adapter failure".to_string()));
        }
        if let Some(pass) = self.passes.pop_front(){
            self.last = pass;
        }
        Ok(self.last.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRecord{
    pub action: CrawlerAction,
    pub steps: u8,
    pub speed: u8,
}

/// Crawler that only records what it was asked to do
#[derive(Clone, Default)]
pub struct SimCrawler{
    log: Arc<RwLock<Vec<ActionRecord>>>,
}

impl SimCrawler{
    pub fn new() -> Self{
        Self::default()
    }

    pub fn actions(&self) -> Vec<ActionRecord>{
        self.log.read().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn action_kinds(&self) -> Vec<CrawlerAction>{
        self.actions().iter().map(|r| r.action).collect()
    }
}

impl Crawler for SimCrawler{
    fn do_action(&mut self, action: CrawlerAction, steps: u8, speed: u8) -> Result<()>{
        log::debug!("[SIM] crawler {} x{} at {}", action.name(), steps, speed);
        if let Ok(mut log) = self.log.write(){
            log.push(ActionRecord{ action, steps, speed });
        }
        Ok(())
    }
}

/// Sonar that replays a distance script; once exhausted it reports no echo
#[derive(Clone, Default)]
pub struct SimSonar{
    script: Arc<RwLock<VecDeque<f32>>>,
}

impl SimSonar{
    pub fn new(distances: &[f32]) -> Self{
        SimSonar{
            script: Arc::new(RwLock::new(distances.iter().copied().collect())),
        }
    }
}

impl RangeSensor for SimSonar{
    fn read_distance(&mut self) -> Result<f32>{
        let next = self.script.write().ok().and_then(|mut s| s.pop_front());
        Ok(next.unwrap_or(-1.0))
    }
}

/// Speaker that records every phrase
#[derive(Clone, Default)]
pub struct SimSpeaker{
    said: Arc<RwLock<Vec<String>>>,
}

impl SimSpeaker{
    pub fn new() -> Self{
        Self::default()
    }

    pub fn phrases(&self) -> Vec<String>{
        self.said.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Speaker for SimSpeaker{
    fn say(&mut self, text: &str) -> Result<()>{
        if let Ok(mut said) = self.said.write(){
            said.push(text.to_string());
        }
        Ok(())
    }
}

/// Display that keeps the last frame and counts refreshes
#[derive(Clone, Default)]
pub struct SimDisplay{
    state: Arc<RwLock<(usize, Option<Frame>)>>,
}

impl SimDisplay{
    pub fn new() -> Self{
        Self::default()
    }

    pub fn refreshes(&self) -> usize{
        self.state.read().map(|s| s.0).unwrap_or(0)
    }

    pub fn last_frame(&self) -> Option<Frame>{
        self.state.read().ok().and_then(|s| s.1.clone())
    }
}

impl Display for SimDisplay{
    fn show(&mut self, frame: &Frame) -> Result<()>{
        if let Ok(mut state) = self.state.write(){
            state.0 += 1;
            state.1 = Some(frame.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_inquiry_repeats_last_pass(){
        let phone: MacAddress = "20:20:08:59:27:13".parse().unwrap();
        let mut inquiry = SimInquiry::scripted(phone, &[None, Some(-50.0)]);

        assert!(inquiry.inquire().unwrap().is_empty());
        assert_eq!(inquiry.inquire().unwrap()[0].rssi, -50.0);
        assert_eq!(inquiry.inquire().unwrap()[0].rssi, -50.0);
    }

    #[test]
    fn test_inquiry_failures_come_first(){
        let phone: MacAddress = "20:20:08:59:27:13".parse().unwrap();
        let mut inquiry = SimInquiry::scripted(phone, &[Some(-50.0)]).failing(1);
        assert!(inquiry.inquire().is_err());
        assert_eq!(inquiry.inquire().unwrap().len(), 1);
    }

    #[test]
    fn test_recorders_share_state(){
        let crawler = SimCrawler::new();
        let mut boxed: Box<dyn Crawler> = Box::new(crawler.clone());
        boxed.do_action(CrawlerAction::Forward, 1, 80).unwrap();
        assert_eq!(crawler.action_kinds(), vec![CrawlerAction::Forward]);

        let sonar = SimSonar::new(&[12.0]);
        let mut boxed: Box<dyn RangeSensor> = Box::new(sonar);
        assert_eq!(boxed.read_distance().unwrap(), 12.0);
        assert_eq!(boxed.read_distance().unwrap(), -1.0);
    }
}
