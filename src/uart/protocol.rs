#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ActionCmd{
    pub action: u8,       //CrawlerAction discriminant
    pub steps: u8,        //repetitions of the gait cycle
    pub speed: u8,        //0-100
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct RangeMsg{
    pub distance_cm: f32, //negative when no echo came back
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct AckMsg{
    pub msg_type: u8,     //type of the frame being acknowledged
    pub status: u8,       //0 = ok
}

//message sizes
pub const ACTION_CMD_SIZE: usize = 3;   //3 * u8
pub const RANGE_MSG_SIZE: usize = 4;    //1 * f32
pub const ACK_MSG_SIZE: usize = 2;      //2 * u8

impl ActionCmd{
    pub fn new(action: u8, steps: u8, speed: u8) -> Self{
        ActionCmd{ action, steps, speed }
    }

    pub fn to_bytes(&self) -> Vec<u8>{
        let mut bytes = vec![0u8; ACTION_CMD_SIZE];
        unsafe{
            std::ptr::copy_nonoverlapping(
                self as *const Self as *const u8,
                bytes.as_mut_ptr(),
                ACTION_CMD_SIZE
            );
        }
        bytes
    }
}

impl RangeMsg{
    pub fn new(distance_cm: f32) -> Self{
        RangeMsg{ distance_cm }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self>{
        if data.len() < RANGE_MSG_SIZE{
            return None;
        }
        unsafe{
            Some(std::ptr::read_unaligned(data.as_ptr() as *const Self))
        }
    }

    pub fn to_bytes(&self) -> Vec<u8>{
        let mut bytes = vec![0u8; RANGE_MSG_SIZE];
        unsafe{
            std::ptr::copy_nonoverlapping(
                self as *const Self as *const u8,
                bytes.as_mut_ptr(),
                RANGE_MSG_SIZE
            );
        }
        bytes
    }
}

impl AckMsg{
    pub fn new(msg_type: u8, status: u8) -> Self{
        AckMsg{ msg_type, status }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self>{
        if data.len() < ACK_MSG_SIZE{
            return None;
        }
        Some(AckMsg{ msg_type: data[0], status: data[1] })
    }

    pub fn to_bytes(&self) -> Vec<u8>{
        vec![self.msg_type, self.status]
    }
}
