/**
 * Bluetooth Discovery
 *
 * Finds the phone by running classic (BR/EDR) discovery passes and
 * averaging the RSSI of every sighting of its address.
 */

pub mod btmgmt;

pub use btmgmt::{BtmgmtInquiry, parse_btmgmt_output};

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::hw::Inquiry;

pub const DEFAULT_PASSES: usize = 3;

/// 48-bit Bluetooth device address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress{
    pub fn new(bytes: [u8; 6]) -> Self{
        MacAddress(bytes)
    }

    pub fn bytes(&self) -> [u8; 6]{
        self.0
    }
}

impl FromStr for MacAddress{
    type Err = Error;

    fn from_str(s: &str) -> Result<Self>{
        let mut bytes = [0u8; 6];
        let mut parts = s.trim().split(':');

        for byte in bytes.iter_mut(){
            let part = parts.next().ok_or_else(|| Error::InvalidMac(s.to_string()))?;
            if part.len() != 2{
                return Err(Error::InvalidMac(s.to_string()));
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| Error::InvalidMac(s.to_string()))?;
        }

        if parts.next().is_some(){
            return Err(Error::InvalidMac(s.to_string()));
        }

        Ok(MacAddress(bytes))
    }
}

impl fmt::Display for MacAddress{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result{
        let b = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", b[0], b[1], b[2], b[3], b[4], b[5])
    }
}

/// A device seen during one discovery pass
#[derive(Debug, Clone, PartialEq)]
pub struct Sighting{
    pub address: MacAddress,
    pub name: Option<String>,
    pub rssi: f32,
}

/// Averages the phone's RSSI over several discovery passes
pub struct PhoneLocator{
    inquiry: Box<dyn Inquiry>,
    phone: MacAddress,
    passes: usize,
}

impl PhoneLocator{
    pub fn new(inquiry: Box<dyn Inquiry>, phone: MacAddress) -> Self{
        PhoneLocator{
            inquiry,
            phone,
            passes: DEFAULT_PASSES,
        }
    }

    pub fn with_passes(mut self, passes: usize) -> Self{
        self.passes = passes.max(1);
        self
    }

    pub fn phone(&self) -> MacAddress{
        self.phone
    }

    /// Average RSSI of the phone over all passes, `None` if it was never seen
    pub fn locate(&mut self) -> Result<Option<f32>>{
        let mut readings = Vec::new();

        for pass in 0..self.passes{
            let sightings = self.inquiry.inquire()?;
            log::debug!("[BT] pass {}: {} device(s)", pass + 1, sightings.len());

            readings.extend(
                sightings.iter()
                    .filter(|s| s.address == self.phone)
                    .map(|s| s.rssi)
            );
        }

        if readings.is_empty(){
            log::info!("[BT] phone {} not detected", self.phone);
            return Ok(None);
        }

        let avg = readings.iter().sum::<f32>() / readings.len() as f32;
        log::info!("[BT] phone detected with average RSSI {:.1} over {} reading(s)", avg, readings.len());
        Ok(Some(avg))
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use crate::sim::SimInquiry;

    const PHONE: &str = "20:20:08:59:27:13";

    #[test]
    fn test_mac_parse_case_insensitive(){
        let upper: MacAddress = "AA:BB:CC:DD:EE:0F".parse().unwrap();
        let lower: MacAddress = "aa:bb:cc:dd:ee:0f".parse().unwrap();
        assert_eq!(upper, lower);
        assert_eq!(lower.to_string(), "AA:BB:CC:DD:EE:0F");
    }

    #[test]
    fn test_mac_parse_rejects_garbage(){
        assert!("20:20:08:59:27".parse::<MacAddress>().is_err());
        assert!("20:20:08:59:27:13:00".parse::<MacAddress>().is_err());
        assert!("20-20-08-59-27-13".parse::<MacAddress>().is_err());
        assert!("zz:20:08:59:27:13".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_locate_averages_matching_sightings(){
        let phone: MacAddress = PHONE.parse().unwrap();
        let other: MacAddress = "11:22:33:44:55:66".parse().unwrap();

        let inquiry = SimInquiry::from_passes(vec![
            vec![Sighting{ address: phone, name: None, rssi: -60.0 }, Sighting{ address: other, name: None, rssi: -20.0 }],
            vec![],
            vec![Sighting{ address: phone, name: Some("Pixel".into()), rssi: -70.0 }],
        ]);

        let mut locator = PhoneLocator::new(Box::new(inquiry), phone);
        let avg = locator.locate().unwrap().unwrap();
        assert!((avg - -65.0).abs() < 1e-4);
    }

    #[test]
    fn test_locate_not_found(){
        let phone: MacAddress = PHONE.parse().unwrap();
        let inquiry = SimInquiry::from_passes(vec![vec![]]);
        let mut locator = PhoneLocator::new(Box::new(inquiry), phone).with_passes(2);
        assert_eq!(locator.locate().unwrap(), None);
    }
}
