use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::{MacAddress, Sighting};
use crate::error::{Error, Result};
use crate::hw::Inquiry;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Classic discovery through BlueZ's `btmgmt find -b`
pub struct BtmgmtInquiry{
    program: String,
    index: u16,
    timeout: Duration,
}

impl BtmgmtInquiry{
    pub fn new() -> Self{
        BtmgmtInquiry{
            program: "btmgmt".to_string(),
            index: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_program(mut self, program: &str) -> Self{
        self.program = program.to_string();
        self
    }

    pub fn with_index(mut self, index: u16) -> Self{
        self.index = index;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self{
        self.timeout = timeout;
        self
    }

    fn run(&self) -> Result<String>{
        let index = self.index.to_string();
        let mut child = Command::new(&self.program)
            .args(["--index", index.as_str(), "find", "-b"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Bluetooth(format!("failed to start {}: {}", self.program, e)))?;

        //drain stdout on a side thread so a chatty scan can't block on a full pipe
        let mut stdout = child.stdout.take()
            .ok_or_else(|| Error::Bluetooth("no stdout from scanner".to_string()))?;
        let reader = thread::spawn(move ||{
            let mut out = String::new();
            let _ = stdout.read_to_string(&mut out);
            out
        });

        //no deadline when the timeout runs past what Instant can hold
        let deadline = Instant::now().checked_add(self.timeout);
        loop{
            match child.try_wait()?{
                Some(status) =>{
                    if !status.success(){
                        log::warn!("[BT] {} exited with {}", self.program, status);
                    }
                    break;
                }
                None if deadline.map_or(false, |d| Instant::now() >= d) =>{
                    //discovery ran long, keep whatever was found so far
                    log::debug!("[BT] scan timed out after {:?}, stopping it", self.timeout);
                    let _ = child.kill();
                    let _ = child.wait();
                    break;
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        }

        reader.join().map_err(|_| Error::Bluetooth("scanner output reader panicked".to_string()))
    }
}

impl Default for BtmgmtInquiry{
    fn default() -> Self{
        Self::new()
    }
}

impl Inquiry for BtmgmtInquiry{
    fn inquire(&mut self) -> Result<Vec<Sighting>>{
        let output = self.run()?;
        Ok(parse_btmgmt_output(&output))
    }
}

/// Extract every `dev_found` event (and any `name` line that follows it)
pub fn parse_btmgmt_output(output: &str) -> Vec<Sighting>{
    let mut sightings: Vec<Sighting> = Vec::new();

    for line in output.lines(){
        let line = line.trim();

        if let Some(rest) = line.split("dev_found:").nth(1){
            let mut tokens = rest.split_whitespace();
            let address = match tokens.next().and_then(|t| t.parse::<MacAddress>().ok()){
                Some(addr) => addr,
                None => continue,
            };

            let mut rssi = None;
            while let Some(token) = tokens.next(){
                if token == "rssi"{
                    rssi = tokens.next().and_then(|v| v.parse::<f32>().ok());
                    break;
                }
            }

            if let Some(rssi) = rssi{
                sightings.push(Sighting{ address, name: None, rssi });
            }
        }else if let Some(name) = line.strip_prefix("name "){
            if let Some(last) = sightings.last_mut(){
                if last.name.is_none(){
                    last.name = Some(name.trim().to_string());
                }
            }
        }
    }

    sightings
}

#[cfg(test)]
mod tests{
    use super::*;

    const SAMPLE: &str = "\
Discovery started
hci0 type 1 discovering on
hci0 dev_found: 20:20:08:59:27:13 type BR/EDR rssi -63 flags 0x0000
name Pixel 7
eir_len 23
hci0 dev_found: 5C:F3:70:0A:11:22 type BR/EDR rssi -81 flags 0x0000
hci0 dev_found: not-an-address type BR/EDR rssi -40 flags 0x0000
hci0 type 1 discovering off
";

    #[test]
    fn test_parse_sightings(){
        let sightings = parse_btmgmt_output(SAMPLE);
        assert_eq!(sightings.len(), 2);

        assert_eq!(sightings[0].address, "20:20:08:59:27:13".parse().unwrap());
        assert_eq!(sightings[0].rssi, -63.0);
        assert_eq!(sightings[0].name.as_deref(), Some("Pixel 7"));

        assert_eq!(sightings[1].rssi, -81.0);
        assert!(sightings[1].name.is_none());
    }

    #[test]
    fn test_parse_skips_missing_rssi(){
        let sightings = parse_btmgmt_output("hci0 dev_found: 20:20:08:59:27:13 type BR/EDR flags 0x0000\n");
        assert!(sightings.is_empty());
    }

    #[test]
    fn test_parse_empty(){
        assert!(parse_btmgmt_output("").is_empty());
        assert!(parse_btmgmt_output("Discovery started\n").is_empty());
    }

    #[test]
    fn test_unbounded_timeout(){
        //`true` ignores its arguments and prints nothing
        let mut inquiry = BtmgmtInquiry::new()
            .with_program("true")
            .with_timeout(Duration::MAX);
        assert!(inquiry.inquire().unwrap().is_empty());
    }

    #[test]
    fn test_missing_program_is_an_error(){
        let mut inquiry = BtmgmtInquiry::new().with_program("/nonexistent/btmgmt");
        assert!(inquiry.inquire().is_err());
    }
}
