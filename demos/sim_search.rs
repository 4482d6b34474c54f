/**
 * Simulated Search Walkthrough
 *
 * Runs the search heuristic against simulated hardware, one iteration
 * at a time, and prints:
 * - each decision and the resulting heading
 * - the crawler actions issued
 * - the final compass screen as ASCII art
 */

use phonefind::config::SearchConfig;
use phonefind::display::{HEIGHT, WIDTH};
use phonefind::sim::{SimCrawler, SimDisplay, SimInquiry, SimSonar, SimSpeaker};
use phonefind::{Frame, Hardware, MacAddress, PhoneFinder, SearchPlanner};

fn print_frame(frame: &Frame){
    //two pixel rows per text line keeps the dial roughly round
    for y in (0..HEIGHT as i32).step_by(2){
        let line: String = (0..WIDTH as i32)
            .map(|x| match (frame.pixel(x, y), frame.pixel(x, y + 1)){
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            })
            .collect();
        println!("{}", line.trim_end());
    }
}

fn main(){
    let phone: MacAddress = "20:20:08:59:27:13".parse().unwrap();
    let script = [
        None, Some(-84.0), Some(-80.0), Some(-80.0), Some(-74.0),
        Some(-79.0), Some(-70.0), Some(-62.0), Some(-58.0), Some(-51.0),
    ];

    let crawler = SimCrawler::new();
    let speaker = SimSpeaker::new();
    let display = SimDisplay::new();

    let hw = Hardware{
        inquiry: Box::new(SimInquiry::scripted(phone, &script)),
        crawler: Box::new(crawler.clone()),
        sonar: Box::new(SimSonar::new(&[55.0, 40.0, 33.0, 11.0, 70.0, 65.0, 60.0])),
        speaker: Box::new(speaker.clone()),
        display: Box::new(display.clone()),
    };

    let settings = SearchConfig{ interval_ms: 0, ..SearchConfig::default() };
    let mut finder = PhoneFinder::new(hw, 1, phone, SearchPlanner::default(), settings);

    println!("==============================================");
    println!("  phonefind simulated search");
    println!("==============================================\n");

    for i in 0..script.len(){
        let before = crawler.actions().len();
        match finder.step(){
            Ok(report) =>{
                let smoothed = report.decision.smoothed()
                    .map(|s| format!("{:.1} dBm", s))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{:<2} {:<10} rssi={:<10} gauge={:<5} heading={:>3} obstacle={}",
                    i + 1,
                    report.decision.label(),
                    smoothed,
                    report.signal_angle.map(|a| format!("{:.0}", a)).unwrap_or_else(|| "-".to_string()),
                    report.heading.degrees(),
                    report.obstacle,
                );
                for action in &crawler.actions()[before..]{
                    println!("      -> {}", action.action.name());
                }
            }
            Err(e) => println!("#{:<2} error: {}", i + 1, e),
        }
    }

    println!("\nSpoken:");
    for phrase in speaker.phrases(){
        println!("  \"{}\"", phrase);
    }

    if let Some(frame) = display.last_frame(){
        println!("\nLast compass screen ({} refreshes):", display.refreshes());
        print_frame(&frame);
    }
}
