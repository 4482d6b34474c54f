pub mod protocol;
pub use protocol::*;

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use serialport::SerialPort;

use crate::error::{Error, Result};
use crate::hw::{Crawler, CrawlerAction, RangeSensor};

pub const SYNC_BYTE: u8 = 0xAA;
pub const MAX_MSG_SIZE: usize = 244;
pub const DEFAULT_BAUD: u32 = 115_200;

const READ_TIMEOUT: Duration = Duration::from_millis(10);
const STEP_TIMEOUT: Duration = Duration::from_millis(3000);
const RANGE_TIMEOUT: Duration = Duration::from_millis(500);
const DRAIN_READS: usize = 16;
const MAX_PENDING: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType{
    Heartbeat = 0x04,
    Ack = 0x11,
    Action = 0x20,
    RangeRequest = 0x21,
    Range = 0x22,
}

impl MsgType{
    pub fn from_u8(val: u8) -> Option<Self>{
        match val{
            0x04 => Some(MsgType::Heartbeat),
            0x11 => Some(MsgType::Ack),
            0x20 => Some(MsgType::Action),
            0x21 => Some(MsgType::RangeRequest),
            0x22 => Some(MsgType::Range),
            _ => None,
        }
    }

    fn name(&self) -> &'static str{
        match self{
            MsgType::Heartbeat => "heartbeat",
            MsgType::Ack => "ack",
            MsgType::Action => "action",
            MsgType::RangeRequest => "range request",
            MsgType::Range => "range",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UartFrame{
    pub msg_type: MsgType,
    pub payload: Vec<u8>,
}

pub fn calculate_checksum(data: &[u8]) -> u8{
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

//frame format: [SYNC][TYPE][LEN][PAYLOAD...][CHECKSUM]
//              0xAA  1byte 1byte  LEN bytes   1byte
pub fn encode_frame(msg_type: MsgType, payload: &[u8]) -> Result<Vec<u8>>{
    if payload.len() > MAX_MSG_SIZE{
        return Err(Error::PayloadTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.push(SYNC_BYTE);
    frame.push(msg_type as u8);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);

    let checksum = calculate_checksum(&frame[1..]);
    frame.push(checksum);
    Ok(frame)
}

/// Pull every complete frame out of `buffer`, leaving any partial tail in place.
/// Leading garbage is skipped; a bad checksum or length costs one byte.
pub fn drain_frames(buffer: &mut Vec<u8>) -> Vec<UartFrame>{
    let mut frames = Vec::new();

    loop{
        let sync_pos = match buffer.iter().position(|&b| b == SYNC_BYTE){
            Some(pos) => pos,
            None =>{
                buffer.clear();
                break;
            }
        };
        if sync_pos > 0{
            buffer.drain(0..sync_pos);
        }

        if buffer.len() < 4{
            break;
        }

        let msg_type_byte = buffer[1];
        let len = buffer[2] as usize;

        if len > MAX_MSG_SIZE{
            buffer.remove(0);
            continue;
        }

        let frame_len = 4 + len; //sync + type + len + payload + checksum
        if buffer.len() < frame_len{
            break;
        }

        let checksum = buffer[3 + len];
        if checksum != calculate_checksum(&buffer[1..3 + len]){
            buffer.remove(0);
            continue;
        }

        let payload = buffer[3..3 + len].to_vec();
        buffer.drain(0..frame_len);

        match MsgType::from_u8(msg_type_byte){
            Some(msg_type) => frames.push(UartFrame{ msg_type, payload }),
            None => log::debug!("[UART] dropping frame with unknown type {:#04x}", msg_type_byte),
        }
    }

    frames
}

/// Host side of the link to the crawler's motion co-processor
pub struct CrawlerBridge<P: Read + Write + Send>{
    port: P,
    rx_buffer: Vec<u8>,
    //decoded frames nobody has asked for yet
    pending: VecDeque<UartFrame>,
    step_timeout: Duration,
    range_timeout: Duration,
}

impl CrawlerBridge<Box<dyn SerialPort>>{
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self>{
        log::info!("[UART] opening {} at {} baud", port_name, baud_rate);
        let port = serialport::new(port_name, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(CrawlerBridge::new(port))
    }
}

impl<P: Read + Write + Send> CrawlerBridge<P>{
    pub fn new(port: P) -> Self{
        CrawlerBridge{
            port,
            rx_buffer: Vec::with_capacity(512),
            pending: VecDeque::new(),
            step_timeout: STEP_TIMEOUT,
            range_timeout: RANGE_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, step_timeout: Duration, range_timeout: Duration) -> Self{
        self.step_timeout = step_timeout;
        self.range_timeout = range_timeout;
        self
    }

    pub fn port(&self) -> &P{
        &self.port
    }

    /// Send a request. Anything received before it can't be its reply and is dropped.
    pub fn send_frame(&mut self, msg_type: MsgType, payload: &[u8]) -> Result<()>{
        let frame = encode_frame(msg_type, payload)?;
        self.discard_input()?;
        self.port.write_all(&frame)?;
        self.port.flush()?;
        Ok(())
    }

    fn discard_input(&mut self) -> Result<()>{
        let mut read_buf = [0u8; 256];
        let mut dropped = self.rx_buffer.len();
        self.rx_buffer.clear();
        self.pending.clear();

        for _ in 0..DRAIN_READS{
            match self.port.read(&mut read_buf){
                Ok(0) => break,
                Ok(n) => dropped += n,
                Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }

        if dropped > 0{
            log::trace!("[UART] dropped {} stale byte(s)", dropped);
        }
        Ok(())
    }

    //read until a frame accepted by `want` shows up, other traffic stays queued
    fn wait_for<F>(&mut self, expected: MsgType, timeout: Duration, mut want: F) -> Result<UartFrame>
    where
        F: FnMut(&UartFrame) -> bool,
    {
        //no deadline when the timeout runs past what Instant can hold
        let deadline = Instant::now().checked_add(timeout);
        let mut read_buf = [0u8; 256];

        loop{
            self.pending.extend(drain_frames(&mut self.rx_buffer));
            while self.pending.len() > MAX_PENDING{
                self.pending.pop_front();
            }

            if let Some(pos) = self.pending.iter().position(|f| f.msg_type == expected && want(f)){
                if let Some(frame) = self.pending.remove(pos){
                    return Ok(frame);
                }
            }

            if deadline.map_or(false, |d| Instant::now() >= d){
                return Err(Error::Timeout{
                    expected: expected.name(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }

            match self.port.read(&mut read_buf){
                Ok(n) if n > 0 => self.rx_buffer.extend_from_slice(&read_buf[..n]),
                Ok(_) => {}
                Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<P: Read + Write + Send> Crawler for CrawlerBridge<P>{
    fn do_action(&mut self, action: CrawlerAction, steps: u8, speed: u8) -> Result<()>{
        log::debug!("[UART] {} x{} at speed {}", action.name(), steps, speed);
        let cmd = ActionCmd::new(action as u8, steps, speed.min(100));
        self.send_frame(MsgType::Action, &cmd.to_bytes())?;

        let timeout = self.step_timeout
            .checked_mul(u32::from(steps.max(1)))
            .unwrap_or(Duration::MAX);
        let frame = self.wait_for(MsgType::Ack, timeout, |f|{
            AckMsg::from_bytes(&f.payload).map_or(false, |ack| ack.msg_type == MsgType::Action as u8)
        })?;

        match AckMsg::from_bytes(&frame.payload){
            Some(ack) if ack.status == 0 => Ok(()),
            Some(ack) => Err(Error::Nack{ msg_type: ack.msg_type, status: ack.status }),
            None => Err(Error::Nack{ msg_type: MsgType::Action as u8, status: 0xFF }),
        }
    }
}

impl<P: Read + Write + Send> RangeSensor for CrawlerBridge<P>{
    fn read_distance(&mut self) -> Result<f32>{
        self.send_frame(MsgType::RangeRequest, &[])?;
        let timeout = self.range_timeout;
        let frame = self.wait_for(MsgType::Range, timeout, |f| f.payload.len() >= RANGE_MSG_SIZE)?;

        let distance = RangeMsg::from_bytes(&frame.payload)
            .map(|msg| msg.distance_cm)
            .unwrap_or(-1.0);
        log::trace!("[UART] range {:.1} cm", distance);
        Ok(distance)
    }
}

/// One bridge serving both the crawler and the sonar, which share the serial link
pub struct SharedBridge<P: Read + Write + Send>{
    inner: Arc<Mutex<CrawlerBridge<P>>>,
}

impl<P: Read + Write + Send> SharedBridge<P>{
    pub fn new(bridge: CrawlerBridge<P>) -> Self{
        SharedBridge{ inner: Arc::new(Mutex::new(bridge)) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CrawlerBridge<P>>>{
        self.inner.lock().map_err(|_| Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "serial bridge lock poisoned"
        )))
    }
}

impl<P: Read + Write + Send> Clone for SharedBridge<P>{
    fn clone(&self) -> Self{
        SharedBridge{ inner: Arc::clone(&self.inner) }
    }
}

impl<P: Read + Write + Send> Crawler for SharedBridge<P>{
    fn do_action(&mut self, action: CrawlerAction, steps: u8, speed: u8) -> Result<()>{
        self.lock()?.do_action(action, steps, speed)
    }
}

impl<P: Read + Write + Send> RangeSensor for SharedBridge<P>{
    fn read_distance(&mut self) -> Result<f32>{
        self.lock()?.read_distance()
    }
}
