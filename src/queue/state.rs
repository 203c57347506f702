pub struct QueueState {
    pub head: usize,
    pub tail: usize,
    pub size: usize,
    pub closed: bool,
}
