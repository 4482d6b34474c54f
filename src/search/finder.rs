/**
 * Phone Finder
 *
 * The control loop:
 * 1. Scans for the phone (averaged over several discovery passes)
 * 2. Smooths the reading and compares it with the previous one
 * 3. Walks forward, turns, or dodges an obstacle accordingly
 * 4. Redraws the compass and says what it is doing
 */

use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::thread;
use std::time::{Duration, Instant};

use crate::bluetooth::{MacAddress, PhoneLocator};
use crate::config::SearchConfig;
use crate::display::compass_frame;
use crate::error::Result;
use crate::hw::{Crawler, CrawlerAction, Display, Hardware, RangeSensor, Speaker};
use super::planner::{Decision, Heading, SearchPlanner, Turn};

pub const MSG_OBSTACLE: &str = "Obstacle detected! Avoiding...";
pub const MSG_ERROR: &str = "An error occurred.";

const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// What one iteration did
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport{
    pub decision: Decision,
    pub forward_steps: u8,
    pub obstacle: bool,
    /// turn taken by the decision (or the obstacle dodge), before any resume
    pub turn: Option<Turn>,
    pub heading: Heading,
    pub signal_angle: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary{
    pub iterations: u64,
    pub errors: u64,
    pub final_heading: u16,
}

pub struct PhoneFinder{
    locator: PhoneLocator,
    crawler: Box<dyn Crawler>,
    sonar: Box<dyn RangeSensor>,
    speaker: Box<dyn Speaker>,
    display: Box<dyn Display>,
    planner: SearchPlanner,
    settings: SearchConfig,
    running: Arc<AtomicBool>,
    max_iterations: Option<u64>,
}

impl PhoneFinder{
    pub fn new(hw: Hardware, locator_passes: usize, phone: MacAddress, planner: SearchPlanner, settings: SearchConfig) -> Self{
        let Hardware{ inquiry, crawler, sonar, speaker, display } = hw;
        PhoneFinder{
            locator: PhoneLocator::new(inquiry, phone).with_passes(locator_passes),
            crawler,
            sonar,
            speaker,
            display,
            planner,
            settings,
            running: Arc::new(AtomicBool::new(false)),
            max_iterations: None,
        }
    }

    /// Stop after `limit` iterations instead of running until told to stop
    pub fn with_max_iterations(mut self, limit: u64) -> Self{
        self.max_iterations = Some(limit);
        self
    }

    pub fn planner(&self) -> &SearchPlanner{
        &self.planner
    }

    pub fn heading(&self) -> Heading{
        self.planner.heading()
    }

    /// Flag shared with `run`; clearing it ends the loop after the current iteration
    pub fn stop_handle(&self) -> Arc<AtomicBool>{
        Arc::clone(&self.running)
    }

    pub fn shutdown(&self){
        self.running.store(false, Ordering::SeqCst);
    }

    /// Run the search loop (blocking)
    pub fn run(&mut self) -> RunSummary{
        self.running.store(true, Ordering::SeqCst);
        self.run_loop()
    }

    /// Start in background thread
    pub fn start_background(mut self) -> (thread::JoinHandle<RunSummary>, Arc<AtomicBool>){
        let running = self.stop_handle();
        self.running.store(true, Ordering::SeqCst);

        let handle = thread::spawn(move ||{
            self.run_loop()
        });

        (handle, running)
    }

    fn run_loop(&mut self) -> RunSummary{
        let mut summary = RunSummary::default();
        log::info!("[FIND] searching for {}", self.locator.phone());

        while self.running.load(Ordering::SeqCst){
            if let Some(limit) = self.max_iterations{
                if summary.iterations >= limit{
                    break;
                }
            }

            summary.iterations += 1;
            match self.step(){
                Ok(report) =>{
                    log::debug!(
                        "[FIND] #{} {} heading={} turn={:?} steps={}",
                        summary.iterations, report.decision.label(), report.heading.degrees(),
                        report.turn, report.forward_steps
                    );
                }
                Err(e) =>{
                    summary.errors += 1;
                    log::error!("An error occurred: {}", e);
                    if let Err(e) = self.speaker.say(MSG_ERROR){
                        log::warn!("[TTS] {}", e);
                    }
                }
            }

            if self.max_iterations.map_or(false, |limit| summary.iterations >= limit){
                break;
            }
            self.pause();
        }

        summary.final_heading = self.planner.heading().degrees();
        log::info!("[FIND] stopped after {} iteration(s), {} error(s)", summary.iterations, summary.errors);
        summary
    }

    //fixed delay between iterations, cut short by shutdown
    fn pause(&self){
        let deadline = Instant::now().checked_add(self.settings.interval());
        while self.running.load(Ordering::SeqCst){
            let now = Instant::now();
            let left = match deadline{
                Some(deadline) if now >= deadline => break,
                Some(deadline) => deadline - now,
                None => SLEEP_SLICE,
            };
            thread::sleep(SLEEP_SLICE.min(left));
        }
    }

    /// One scan-decide-act iteration
    pub fn step(&mut self) -> Result<StepReport>{
        let reading = match self.locator.locate(){
            Ok(reading) => reading,
            Err(e) =>{
                log::error!("Bluetooth scanning error: {}", e);
                None
            }
        };

        let decision = self.planner.decide(reading);
        let signal_angle = decision.smoothed().map(|s| self.planner.signal_angle(s));
        if let (Some(smoothed), Some(angle)) = (decision.smoothed(), signal_angle){
            log::debug!("[FIND] smoothed RSSI {:.1} dBm, gauge {:.0} deg", smoothed, angle);
        }

        let mut report = StepReport{
            decision,
            forward_steps: 0,
            obstacle: false,
            turn: None,
            heading: self.planner.heading(),
            signal_angle,
        };

        match decision{
            Decision::FirstFix{ smoothed } =>{
                log::info!("[FIND] first fix at {:.1} dBm", smoothed);
            }
            Decision::Stronger{ smoothed, .. } =>{
                self.announce(decision.message())?;
                for _ in 0..self.settings.forward_steps{
                    self.crawler.do_action(CrawlerAction::Forward, 1, self.settings.speed)?;
                    report.forward_steps += 1;

                    let distance = self.sonar.read_distance()?;
                    if distance > 0.0 && distance <= self.settings.obstacle_cm{
                        self.announce(Some(MSG_OBSTACLE))?;
                        self.turn(Turn::Right)?;
                        report.obstacle = true;
                        report.turn = Some(Turn::Right);
                        break;
                    }
                }
                self.draw(Some(smoothed))?;
            }
            Decision::Weaker{ .. } | Decision::Unchanged{ .. } | Decision::NotFound =>{
                self.announce(decision.message())?;
                if let Some(turn) = decision.turn(){
                    self.turn(turn)?;
                    report.turn = Some(turn);
                }
                self.draw(None)?;
            }
        }

        report.heading = self.planner.heading();

        //face the way we were going before this iteration's turn
        if self.settings.resume_after_turn{
            if let Some(turn) = report.turn{
                self.turn(turn.opposite())?;
            }
        }

        Ok(report)
    }

    fn announce(&mut self, message: Option<&str>) -> Result<()>{
        if let Some(message) = message{
            log::info!("{}", message);
            self.speaker.say(message)?;
        }
        Ok(())
    }

    fn turn(&mut self, turn: Turn) -> Result<Heading>{
        let action = match turn{
            Turn::Left => CrawlerAction::TurnLeft,
            Turn::Right => CrawlerAction::TurnRight,
        };
        self.crawler.do_action(action, 1, self.settings.speed)?;
        Ok(self.planner.apply_turn(turn))
    }

    fn draw(&mut self, rssi: Option<f32>) -> Result<()>{
        let frame = compass_frame(f32::from(self.planner.heading().degrees()), rssi);
        self.display.show(&frame)
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use crate::sim::{SimCrawler, SimDisplay, SimInquiry, SimSonar, SimSpeaker};
    use crate::error::Error;

    const PHONE: &str = "20:20:08:59:27:13";

    struct Rig{
        finder: PhoneFinder,
        crawler: SimCrawler,
        speaker: SimSpeaker,
        display: SimDisplay,
    }

    //one discovery pass per iteration, no delay between iterations
    fn rig(script: &[Option<f32>], sonar: &[f32], resume: bool) -> Rig{
        rig_with_inquiry(SimInquiry::scripted(PHONE.parse().unwrap(), script), sonar, resume)
    }

    fn rig_with_inquiry(inquiry: SimInquiry, sonar: &[f32], resume: bool) -> Rig{
        let phone: MacAddress = PHONE.parse().unwrap();
        let crawler = SimCrawler::new();
        let speaker = SimSpeaker::new();
        let display = SimDisplay::new();

        let hw = Hardware{
            inquiry: Box::new(inquiry),
            crawler: Box::new(crawler.clone()),
            sonar: Box::new(SimSonar::new(sonar)),
            speaker: Box::new(speaker.clone()),
            display: Box::new(display.clone()),
        };
        let settings = SearchConfig{ interval_ms: 0, resume_after_turn: resume, ..SearchConfig::default() };
        let finder = PhoneFinder::new(hw, 1, phone, SearchPlanner::default(), settings);

        Rig{ finder, crawler, speaker, display }
    }

    #[test]
    fn test_first_fix_takes_no_action(){
        let mut rig = rig(&[Some(-60.0)], &[], true);
        let report = rig.finder.step().unwrap();

        assert_eq!(report.decision, Decision::FirstFix{ smoothed: -60.0 });
        assert_eq!(report.signal_angle, Some(90.0));
        assert!(rig.crawler.actions().is_empty());
        assert!(rig.speaker.phrases().is_empty());
        assert_eq!(rig.display.refreshes(), 0);
    }

    #[test]
    fn test_stronger_walks_three_steps(){
        let mut rig = rig(&[Some(-70.0), Some(-50.0)], &[40.0, 80.0, -1.0], true);
        rig.finder.step().unwrap();
        let report = rig.finder.step().unwrap();

        assert_eq!(report.forward_steps, 3);
        assert!(!report.obstacle);
        assert_eq!(report.turn, None);
        assert_eq!(report.heading.degrees(), 0);
        assert_eq!(rig.crawler.action_kinds(), vec![CrawlerAction::Forward; 3]);
        assert!(rig.crawler.actions().iter().all(|a| a.steps == 1 && a.speed == 80));
        assert_eq!(rig.speaker.phrases(), vec!["Signal stronger. Continuing forward."]);
        assert_eq!(rig.display.refreshes(), 1);

        //needle at 0 degrees with the smoothed RSSI (-60) printed
        let frame = rig.display.last_frame().unwrap();
        assert_eq!(frame, compass_frame(0.0, Some(-60.0)));
    }

    #[test]
    fn test_obstacle_dodges_right_then_resumes(){
        let mut rig = rig(&[Some(-70.0), Some(-50.0)], &[40.0, 12.0, 50.0], true);
        rig.finder.step().unwrap();
        let report = rig.finder.step().unwrap();

        assert_eq!(report.forward_steps, 2);
        assert!(report.obstacle);
        assert_eq!(report.turn, Some(Turn::Right));
        assert_eq!(report.heading.degrees(), 90);
        assert_eq!(rig.crawler.action_kinds(), vec![
            CrawlerAction::Forward,
            CrawlerAction::Forward,
            CrawlerAction::TurnRight,
            CrawlerAction::TurnLeft,
        ]);
        assert_eq!(rig.finder.heading().degrees(), 0);
        assert_eq!(rig.speaker.phrases(), vec![
            "Signal stronger. Continuing forward.",
            MSG_OBSTACLE,
        ]);
        //the needle shows the dodge heading
        assert_eq!(rig.display.last_frame().unwrap(), compass_frame(90.0, Some(-60.0)));
    }

    #[test]
    fn test_zero_distance_is_not_an_obstacle(){
        let mut rig = rig(&[Some(-70.0), Some(-50.0)], &[0.0, -1.0, 15.0], false);
        rig.finder.step().unwrap();
        let report = rig.finder.step().unwrap();

        //15 cm is still inside the threshold
        assert_eq!(report.forward_steps, 3);
        assert!(report.obstacle);
    }

    #[test]
    fn test_weaker_turns_left(){
        let mut rig = rig(&[Some(-50.0), Some(-70.0)], &[], false);
        rig.finder.step().unwrap();
        let report = rig.finder.step().unwrap();

        assert_eq!(report.turn, Some(Turn::Left));
        assert_eq!(report.heading.degrees(), 270);
        assert_eq!(rig.crawler.action_kinds(), vec![CrawlerAction::TurnLeft]);
        assert_eq!(rig.speaker.phrases(), vec!["Signal weaker. Turning to find stronger signal."]);
        assert_eq!(rig.display.last_frame().unwrap(), compass_frame(270.0, None));
    }

    #[test]
    fn test_unchanged_turns_right(){
        let mut rig = rig(&[Some(-60.0), Some(-60.0)], &[], false);
        rig.finder.step().unwrap();
        let report = rig.finder.step().unwrap();

        assert_eq!(report.decision, Decision::Unchanged{ smoothed: -60.0 });
        assert_eq!(report.heading.degrees(), 90);
        assert_eq!(rig.crawler.action_kinds(), vec![CrawlerAction::TurnRight]);
    }

    #[test]
    fn test_not_found_turns_left_and_resumes(){
        let mut rig = rig(&[None], &[], true);
        let report = rig.finder.step().unwrap();

        assert_eq!(report.decision, Decision::NotFound);
        assert_eq!(report.heading.degrees(), 270);
        assert_eq!(rig.finder.heading().degrees(), 0);
        assert_eq!(rig.crawler.action_kinds(), vec![CrawlerAction::TurnLeft, CrawlerAction::TurnRight]);
        assert_eq!(rig.speaker.phrases(), vec!["Phone not detected. Scanning..."]);
        assert_eq!(rig.display.refreshes(), 1);
    }

    #[test]
    fn test_scan_error_counts_as_not_found(){
        let inquiry = SimInquiry::scripted(PHONE.parse().unwrap(), &[Some(-60.0)]).failing(1);
        let mut rig = rig_with_inquiry(inquiry, &[], false);

        let report = rig.finder.step().unwrap();
        assert_eq!(report.decision, Decision::NotFound);
    }

    #[test]
    fn test_run_stops_at_iteration_limit(){
        let rig = rig(&[None, Some(-80.0), Some(-60.0), Some(-90.0)], &[], false);
        let mut finder = rig.finder.with_max_iterations(4);
        let summary = finder.run();

        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.errors, 0);
        //left (not found), none (first fix), none (stronger, no obstacle), left (weaker)
        assert_eq!(summary.final_heading, 180);
    }

    struct BrokenCrawler;

    impl Crawler for BrokenCrawler{
        fn do_action(&mut self, _action: CrawlerAction, _steps: u8, _speed: u8) -> Result<()>{
            Err(Error::Timeout{ expected: "ack", timeout_ms: 10 })
        }
    }

    #[test]
    fn test_run_survives_errors(){
        let speaker = SimSpeaker::new();
        let hw = Hardware{
            inquiry: Box::new(SimInquiry::from_passes(vec![vec![]])),
            crawler: Box::new(BrokenCrawler),
            sonar: Box::new(SimSonar::default()),
            speaker: Box::new(speaker.clone()),
            display: Box::new(SimDisplay::new()),
        };
        let settings = SearchConfig{ interval_ms: 0, ..SearchConfig::default() };
        let mut finder = PhoneFinder::new(hw, 1, PHONE.parse().unwrap(), SearchPlanner::default(), settings)
            .with_max_iterations(2);

        let summary = finder.run();
        assert_eq!(summary.iterations, 2);
        assert_eq!(summary.errors, 2);
        assert_eq!(speaker.phrases().iter().filter(|p| p.as_str() == MSG_ERROR).count(), 2);
    }

    #[test]
    fn test_background_run_can_be_stopped(){
        let phone: MacAddress = PHONE.parse().unwrap();
        let hw = Hardware{
            inquiry: Box::new(SimInquiry::scripted(phone, &[None])),
            crawler: Box::new(SimCrawler::new()),
            sonar: Box::new(SimSonar::default()),
            speaker: Box::new(SimSpeaker::new()),
            display: Box::new(SimDisplay::new()),
        };
        let settings = SearchConfig{ interval_ms: 20, ..SearchConfig::default() };
        let finder = PhoneFinder::new(hw, 1, phone, SearchPlanner::default(), settings);

        let (handle, running) = finder.start_background();
        thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::SeqCst);

        let summary = handle.join().unwrap();
        assert!(summary.iterations >= 1);
    }
}
