//5x7 glyphs, one byte per column, bit 0 is the top row
pub const GLYPH_WIDTH: usize = 5;
pub const GLYPH_HEIGHT: usize = 7;
pub const ADVANCE: i32 = 6;

const DIGITS: [[u8; GLYPH_WIDTH]; 10] = [
    [0x3E, 0x51, 0x49, 0x45, 0x3E], //0
    [0x00, 0x42, 0x7F, 0x40, 0x00], //1
    [0x42, 0x61, 0x51, 0x49, 0x46], //2
    [0x21, 0x41, 0x45, 0x4B, 0x31], //3
    [0x18, 0x14, 0x12, 0x7F, 0x10], //4
    [0x27, 0x45, 0x45, 0x45, 0x39], //5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], //6
    [0x01, 0x71, 0x09, 0x05, 0x03], //7
    [0x36, 0x49, 0x49, 0x49, 0x36], //8
    [0x06, 0x49, 0x49, 0x29, 0x1E], //9
];

const MINUS: [u8; GLYPH_WIDTH] = [0x08, 0x08, 0x08, 0x08, 0x08];
const DOT: [u8; GLYPH_WIDTH] = [0x00, 0x60, 0x60, 0x00, 0x00];
const SPACE: [u8; GLYPH_WIDTH] = [0x00; GLYPH_WIDTH];

pub fn glyph(ch: char) -> Option<&'static [u8; GLYPH_WIDTH]>{
    match ch{
        '0'..='9' => Some(&DIGITS[ch as usize - '0' as usize]),
        '-' => Some(&MINUS),
        '.' => Some(&DOT),
        ' ' => Some(&SPACE),
        _ => None,
    }
}
