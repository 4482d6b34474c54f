/**
 * Display Module
 *
 * 128x64 monochrome framebuffer in SSD1306 page layout, the drawing
 * primitives the compass needs, and the compass screen itself.
 */

pub mod font;
pub mod ssd1306;

pub use ssd1306::Ssd1306;

pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 64;
pub const PAGES: usize = HEIGHT / 8;
pub const FRAME_SIZE: usize = WIDTH * PAGES;

pub const CENTER_X: i32 = 64;
pub const CENTER_Y: i32 = 32;
pub const RADIUS: i32 = 30;

//byte (page * WIDTH + x) holds rows page*8 .. page*8+7 of column x, LSB on top
#[derive(Clone, PartialEq, Eq)]
pub struct Frame{
    buffer: [u8; FRAME_SIZE],
}

impl Frame{
    pub fn new() -> Self{
        Frame{ buffer: [0u8; FRAME_SIZE] }
    }

    pub fn clear(&mut self){
        self.buffer = [0u8; FRAME_SIZE];
    }

    /// Pixels outside the screen are ignored
    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool){
        if x < 0 || y < 0 || x >= WIDTH as i32 || y >= HEIGHT as i32{
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let idx = (y / 8) * WIDTH + x;
        let bit = 1u8 << (y % 8);
        if on{
            self.buffer[idx] |= bit;
        }else{
            self.buffer[idx] &= !bit;
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> bool{
        if x < 0 || y < 0 || x >= WIDTH as i32 || y >= HEIGHT as i32{
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        self.buffer[(y / 8) * WIDTH + x] & (1u8 << (y % 8)) != 0
    }

    pub fn lit_pixels(&self) -> usize{
        self.buffer.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn as_bytes(&self) -> &[u8]{
        &self.buffer
    }

    /// Bresenham line, both endpoints inclusive
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32){
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1{ 1 }else{ -1 };
        let sy = if y0 < y1{ 1 }else{ -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop{
            self.set_pixel(x, y, true);
            if x == x1 && y == y1{
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy{
                err += dy;
                x += sx;
            }
            if e2 <= dx{
                err += dx;
                y += sy;
            }
        }
    }

    /// Midpoint circle outline
    pub fn draw_circle(&mut self, cx: i32, cy: i32, r: i32){
        let mut x = r;
        let mut y = 0;
        let mut err = 1 - r;

        while x >= y{
            for (px, py) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)]{
                self.set_pixel(cx + px, cy + py, true);
            }
            y += 1;
            if err < 0{
                err += 2 * y + 1;
            }else{
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    /// Draw text with its top-left corner at (x, y); unknown glyphs render as blanks
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str){
        let mut cursor = x;
        for ch in text.chars(){
            if let Some(glyph) = font::glyph(ch){
                for (col, bits) in glyph.iter().enumerate(){
                    for row in 0..font::GLYPH_HEIGHT{
                        if bits & (1u8 << row) != 0{
                            self.set_pixel(cursor + col as i32, y + row as i32, true);
                        }
                    }
                }
            }
            cursor += font::ADVANCE;
        }
    }
}

impl Default for Frame{
    fn default() -> Self{
        Self::new()
    }
}

impl std::fmt::Debug for Frame{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result{
        f.debug_struct("Frame").field("lit_pixels", &self.lit_pixels()).finish()
    }
}

/// Rim point for a heading; 0 degrees is straight up, angles grow clockwise
pub fn needle_tip(heading_deg: f32) -> (i32, i32){
    let rad = heading_deg.to_radians();
    let x = CENTER_X + (RADIUS as f32 * rad.sin()).round() as i32;
    let y = CENTER_Y - (RADIUS as f32 * rad.cos()).round() as i32;
    (x, y)
}

/// Compass dial with the needle at `heading_deg`, and the RSSI in the middle when known
pub fn compass_frame(heading_deg: f32, rssi: Option<f32>) -> Frame{
    let mut frame = Frame::new();
    frame.draw_circle(CENTER_X, CENTER_Y, RADIUS);

    let (tip_x, tip_y) = needle_tip(heading_deg);
    frame.draw_line(CENTER_X, CENTER_Y, tip_x, tip_y);

    if let Some(rssi) = rssi{
        frame.draw_text(CENTER_X - 10, CENTER_Y - 5, &format!("{:.0}", rssi));
    }

    frame
}
