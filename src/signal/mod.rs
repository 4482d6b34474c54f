/**
 * Signal Module
 *
 * RSSI smoothing (moving average over the last few readings)
 * and the linear RSSI -> gauge angle mapping.
 */

use crate::ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW: usize = 5;

/// Moving average over the most recent RSSI readings (dBm)
pub struct RssiSmoother{
    window: RingBuffer<f32>,
}

impl RssiSmoother{
    pub fn new(capacity: usize) -> Self{
        RssiSmoother{
            window: RingBuffer::new(capacity),
        }
    }

    /// Add a reading and return the mean of everything in the window.
    /// NaN and infinite readings are not added.
    pub fn push(&mut self, rssi: f32) -> f32{
        if !rssi.is_finite(){
            return self.average().unwrap_or(rssi);
        }
        self.window.push(rssi);
        self.average().unwrap_or(rssi)
    }

    pub fn average(&self) -> Option<f32>{
        if self.window.is_empty(){
            return None;
        }
        let sum: f32 = self.window.iter().sum();
        Some(sum / self.window.len() as f32)
    }

    pub fn len(&self) -> usize{
        self.window.len()
    }

    pub fn is_empty(&self) -> bool{
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize{
        self.window.capacity()
    }

    pub fn reset(&mut self){
        self.window.clear();
    }
}

impl Default for RssiSmoother{
    fn default() -> Self{
        RssiSmoother::new(DEFAULT_WINDOW)
    }
}

/// RSSI bounds mapped onto the 0..180 degree gauge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRange{
    /// weakest signal, maps to 0 degrees
    pub min_rssi: f32,
    /// strongest signal, maps to 180 degrees
    pub max_rssi: f32,
}

impl Default for SignalRange{
    fn default() -> Self{
        SignalRange{
            min_rssi: -90.0,
            max_rssi: -30.0,
        }
    }
}

impl SignalRange{
    pub fn angle(&self, rssi: f32) -> f32{
        let span = self.max_rssi - self.min_rssi;
        if span <= 0.0{
            return 0.0;
        }
        let angle = 180.0 * (rssi - self.min_rssi) / span;
        angle.clamp(0.0, 180.0)
    }
}

/// Angle in [0, 180] for an RSSI reading using the default -90..-30 dBm range
pub fn angle_for_rssi(rssi: f32) -> f32{
    SignalRange::default().angle(rssi)
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_smoother_partial_window(){
        let mut smoother = RssiSmoother::default();
        assert!((smoother.push(-60.0) - -60.0).abs() < 1e-4);
        assert!((smoother.push(-70.0) - -65.0).abs() < 1e-4);
        assert_eq!(smoother.len(), 2);
    }

    #[test]
    fn test_smoother_evicts_oldest(){
        let mut smoother = RssiSmoother::default();
        for rssi in [-50.0, -60.0, -70.0, -80.0, -90.0]{
            smoother.push(rssi);
        }
        assert!((smoother.average().unwrap() - -70.0).abs() < 1e-4);

        //-50 falls out: (-60 -70 -80 -90 -40) / 5
        let avg = smoother.push(-40.0);
        assert!((avg - -68.0).abs() < 1e-4);
        assert_eq!(smoother.len(), 5);
    }

    #[test]
    fn test_smoother_reset(){
        let mut smoother = RssiSmoother::new(3);
        smoother.push(-40.0);
        smoother.reset();
        assert!(smoother.is_empty());
        assert!(smoother.average().is_none());
    }

    #[test]
    fn test_smoother_skips_non_finite(){
        let mut smoother = RssiSmoother::default();
        smoother.push(-60.0);
        assert_eq!(smoother.push(f32::NAN), -60.0);
        assert_eq!(smoother.push(f32::NEG_INFINITY), -60.0);
        assert_eq!(smoother.len(), 1);
    }

    #[test]
    fn test_zero_window_holds_one_reading(){
        let mut smoother = RssiSmoother::new(0);
        smoother.push(-40.0);
        assert_eq!(smoother.push(-80.0), -80.0);
        assert_eq!(smoother.capacity(), 1);
    }

    #[test]
    fn test_angle_mapping(){
        assert_eq!(angle_for_rssi(-90.0), 0.0);
        assert_eq!(angle_for_rssi(-60.0), 90.0);
        assert_eq!(angle_for_rssi(-30.0), 180.0);
        assert!((angle_for_rssi(-75.0) - 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_angle_clamped(){
        assert_eq!(angle_for_rssi(-120.0), 0.0);
        assert_eq!(angle_for_rssi(-10.0), 180.0);
    }

    #[test]
    fn test_degenerate_range(){
        let range = SignalRange{ min_rssi: -50.0, max_rssi: -50.0 };
        assert_eq!(range.angle(-50.0), 0.0);
    }
}
