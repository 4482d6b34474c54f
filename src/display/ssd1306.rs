/**
 * SSD1306 OLED over Linux i2c-dev
 *
 * The controller is put in horizontal addressing mode, so a full frame
 * is one column/page window followed by 1024 data bytes.
 */

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::io::AsRawFd;

use super::{Frame, PAGES, WIDTH};
use crate::error::{Error, Result};
use crate::hw::Display;

pub const DEFAULT_BUS: u8 = 1;
pub const DEFAULT_ADDRESS: u16 = 0x3C;

//from linux/i2c-dev.h
const I2C_SLAVE: libc::c_ulong = 0x0703;

const CONTROL_CMD: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;
const DATA_CHUNK: usize = 32;

const INIT_SEQUENCE: &[u8] = &[
    0xAE,       //display off
    0xD5, 0x80, //clock divide
    0xA8, 0x3F, //multiplex 64
    0xD3, 0x00, //no display offset
    0x40,       //start line 0
    0x8D, 0x14, //charge pump on
    0x20, 0x00, //horizontal addressing
    0xA1,       //segment remap
    0xC8,       //com scan descending
    0xDA, 0x12, //com pins
    0x81, 0xCF, //contrast
    0xD9, 0xF1, //precharge
    0xDB, 0x40, //vcomh
    0xA4,       //resume from ram
    0xA6,       //normal (not inverted)
    0x2E,       //scroll off
    0xAF,       //display on
];

pub struct Ssd1306<W: Write>{
    bus: W,
    initialized: bool,
}

impl Ssd1306<File>{
    /// Open `/dev/i2c-<bus>` and bind it to the display's address
    pub fn open(bus: u8, address: u16) -> Result<Self>{
        let path = format!("/dev/i2c-{}", bus);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::Display(format!("cannot open {}: {}", path, e)))?;

        let rc = unsafe{ libc::ioctl(file.as_raw_fd(), I2C_SLAVE as _, address as libc::c_ulong) };
        if rc < 0{
            return Err(Error::Display(format!(
                "cannot select address {:#04x} on {}: {}",
                address, path, std::io::Error::last_os_error()
            )));
        }

        log::info!("[OLED] SSD1306 at {:#04x} on {}", address, path);
        Ok(Ssd1306::new(file))
    }
}

impl<W: Write> Ssd1306<W>{
    pub fn new(bus: W) -> Self{
        Ssd1306{
            bus,
            initialized: false,
        }
    }

    pub fn init(&mut self) -> Result<()>{
        self.command(INIT_SEQUENCE)?;
        self.initialized = true;
        Ok(())
    }

    pub fn flush(&mut self, frame: &Frame) -> Result<()>{
        if !self.initialized{
            self.init()?;
        }

        //full window: columns 0..127, pages 0..7
        self.command(&[0x21, 0x00, (WIDTH - 1) as u8, 0x22, 0x00, (PAGES - 1) as u8])?;

        let mut packet = Vec::with_capacity(DATA_CHUNK + 1);
        for chunk in frame.as_bytes().chunks(DATA_CHUNK){
            packet.clear();
            packet.push(CONTROL_DATA);
            packet.extend_from_slice(chunk);
            self.bus.write_all(&packet)?;
        }
        self.bus.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W{
        self.bus
    }

    fn command(&mut self, cmds: &[u8]) -> Result<()>{
        let mut packet = Vec::with_capacity(cmds.len() + 1);
        packet.push(CONTROL_CMD);
        packet.extend_from_slice(cmds);
        self.bus.write_all(&packet)?;
        Ok(())
    }
}

impl<W: Write + Send> Display for Ssd1306<W>{
    fn show(&mut self, frame: &Frame) -> Result<()>{
        self.flush(frame)
    }
}
