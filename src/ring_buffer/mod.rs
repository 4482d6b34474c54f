//fixed capacity ring that keeps the freshest items
//pushing into a full ring overwrites the oldest slot (freshness bias)
pub struct RingBuffer<T>{
    buffer: Vec<Option<T>>,
    head: usize, //next slot to write
    len: usize,
}

impl<T> RingBuffer<T>{
    /// A capacity of 0 is raised to 1
    pub fn new(capacity: usize) -> Self{
        let capacity = capacity.max(1);

        let mut buffer = Vec::with_capacity(capacity);
        for _ in 0..capacity{
            buffer.push(None);
        }

        RingBuffer{
            buffer,
            head: 0,
            len: 0,
        }
    }

    //push item, discarding the oldest when full
    pub fn push(&mut self, item: T){
        self.buffer[self.head] = Some(item);
        self.head = (self.head + 1) % self.capacity();

        if self.len < self.capacity(){
            self.len += 1;
        }
    }

    //oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_{
        let start = (self.head + self.capacity() - self.len) % self.capacity();
        (0..self.len).filter_map(move |i| self.buffer[(start + i) % self.capacity()].as_ref())
    }

    pub fn clear(&mut self){
        for slot in self.buffer.iter_mut(){
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize{
        self.len
    }

    pub fn is_empty(&self) -> bool{
        self.len == 0
    }

    pub fn capacity(&self) -> usize{
        self.buffer.len()
    }
}
